//! Encoding side of the datalayr pipeline.
//!
//! [encoder::Encoder] and [decoder::Decoder] implement the systematic
//! Reed-Solomon code; [kzg::KzgEncoder] adds the commitment, the low-degree
//! proof and per-frame multireveal proofs ([multiproof]) on top of a shared
//! [srs::SRS]. [group::KzgEncoderGroup] caches one encoder per parameter set.

pub mod decoder;
pub mod encoder;
pub mod group;
pub mod kzg;
pub mod multiproof;
pub mod padding;
pub mod srs;
