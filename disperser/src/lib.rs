//! Dispersal side of datalayr: sizes the code from operator stakes, assigns
//! frames, collects and aggregates operator signatures and builds the
//! confirmation and disclosure material posted on chain.

pub mod aggregator;
pub mod assignment;
pub mod bls;
pub mod cache;
pub mod calldata;
pub mod chain;
pub mod config;
pub mod disclosure;
pub mod disperser;
pub mod errors;
pub mod merkle;
pub mod store;
