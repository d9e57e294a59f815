use ark_bn254::{G1Affine, G2Affine};
use ark_ec::AffineRepr;
// Impl targets spell out the concrete curve types: the `G1Affine`/`G2Affine`
// aliases go through associated-type projections that newer rustc coherence
// checks treat as overlapping.
use ark_ec::short_weierstrass::Affine;

extern crate alloc;
use alloc::{format, string::String, vec::Vec};

use crate::{
    consts::{SIZE_OF_G1_AFFINE_COMPRESSED, SIZE_OF_G2_AFFINE_COMPRESSED},
    helpers,
};

#[derive(Debug, thiserror::Error)]
pub enum PointReadError {
    #[error("Invalid point data: {0}")]
    InvalidData(String),
}

pub type Result<T> = core::result::Result<T, PointReadError>;

/// Curve points that can be read from the two big-endian encodings the
/// system uses: the gnark compressed form of SRS files and the uncompressed
/// wire form.
pub trait ReadPointFromBytes: AffineRepr {
    /// Size in bytes of one compressed point in an SRS file.
    const COMPRESSED_SIZE: usize;

    fn read_point_from_bytes_be(bytes: &[u8]) -> Result<Self>;
    fn read_point_from_bytes_uncompressed_be(bytes: &[u8]) -> Result<Self>;
}

impl ReadPointFromBytes for Affine<ark_bn254::g1::Config> {
    const COMPRESSED_SIZE: usize = SIZE_OF_G1_AFFINE_COMPRESSED;

    fn read_point_from_bytes_be(bytes: &[u8]) -> Result<G1Affine> {
        helpers::read_g1_point_from_bytes_be(bytes)
            .map_err(|e| PointReadError::InvalidData(format!("{:?}", e)))
    }

    fn read_point_from_bytes_uncompressed_be(bytes: &[u8]) -> Result<G1Affine> {
        helpers::deserialize_g1_be(bytes)
            .map_err(|e| PointReadError::InvalidData(format!("{:?}", e)))
    }
}

impl ReadPointFromBytes for Affine<ark_bn254::g2::Config> {
    const COMPRESSED_SIZE: usize = SIZE_OF_G2_AFFINE_COMPRESSED;

    fn read_point_from_bytes_be(bytes: &[u8]) -> Result<G2Affine> {
        helpers::read_g2_point_from_bytes_be(bytes)
            .map_err(|e| PointReadError::InvalidData(format!("{:?}", e)))
    }

    fn read_point_from_bytes_uncompressed_be(bytes: &[u8]) -> Result<G2Affine> {
        helpers::deserialize_g2_be(bytes)
            .map_err(|e| PointReadError::InvalidData(format!("{:?}", e)))
    }
}

/// The uncompressed big-endian encoding used on the wire and in calldata.
pub trait WritePointToBytes {
    fn write_point_to_bytes_be(&self) -> Vec<u8>;
}

impl WritePointToBytes for Affine<ark_bn254::g1::Config> {
    fn write_point_to_bytes_be(&self) -> Vec<u8> {
        helpers::serialize_g1_be(self).to_vec()
    }
}

impl WritePointToBytes for Affine<ark_bn254::g2::Config> {
    fn write_point_to_bytes_be(&self) -> Vec<u8> {
        helpers::serialize_g2_be(self).to_vec()
    }
}
