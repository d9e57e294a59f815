//! ## Library Design / Architecture
//!
//! Shared building blocks for the datalayr coding pipeline:
//!
//! > user data -> field elements (31 bytes each) -> global polynomial ->
//! > [frame::Frame]s (one per chunk, each with a KZG multireveal proof)
//!
//! - [params::EncodingParams]: every size the encoder, decoder and verifier
//!   derive from `(numSys, numPar, dataLen)`.
//! - [rb]: the bit-reversal permutation that maps chunk slots to cosets of the
//!   evaluation domain. Every higher-level algorithm depends on it.
//! - [fft::FFTSettings]: root-of-unity tables and forward/inverse FFTs over
//!   scalars and G1 points, plus the coset interpolation helpers.
//! - [frame::Frame] and [header::DataStoreHeader]: the big-endian wire formats
//!   exchanged with operators and the chain.
//!
//! The prover, verifier and disperser crates build on these types.

pub mod consts;
pub mod errors;
pub mod fft;
pub mod frame;
pub mod header;
pub mod helpers;
pub mod params;
pub mod polynomial;
pub mod rb;
pub mod traits;
