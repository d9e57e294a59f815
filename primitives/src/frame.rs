use ark_bn254::{Fr, G1Affine};
use ark_std::vec::Vec;

extern crate alloc;
use alloc::string::ToString;

use crate::{
    consts::{BYTES_PER_FIELD_ELEMENT, SIZE_OF_G1_AFFINE_UNCOMPRESSED},
    errors::FrameError,
    helpers,
};

const COUNT_SIZE: usize = 4;
const HEADER_SIZE: usize = SIZE_OF_G1_AFFINE_UNCOMPRESSED + COUNT_SIZE;

/// One coded chunk: the chunk's interpolation polynomial in coefficient form
/// and the KZG multireveal proof that it agrees with the committed global
/// polynomial on the chunk's coset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub proof: G1Affine,
    pub coeffs: Vec<Fr>,
}

impl Frame {
    pub fn new(proof: G1Affine, coeffs: Vec<Fr>) -> Self {
        Self { proof, coeffs }
    }

    /// Number of coefficients, i.e. `chunkLen`.
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.coeffs.len() * BYTES_PER_FIELD_ELEMENT
    }

    /// `proof (64) | u32 BE coefficient count | coefficients (32 BE each)`
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&helpers::serialize_g1_be(&self.proof));
        out.extend_from_slice(&(self.coeffs.len() as u32).to_be_bytes());
        for coeff in &self.coeffs {
            out.extend_from_slice(&helpers::fr_to_bytes_be(coeff));
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FrameError::TooShort { len: bytes.len() });
        }
        let (proof_bytes, rest) = bytes.split_at(SIZE_OF_G1_AFFINE_UNCOMPRESSED);
        let (count_bytes, body) = rest.split_at(COUNT_SIZE);

        let mut count = [0u8; COUNT_SIZE];
        count.copy_from_slice(count_bytes);
        let count = u32::from_be_bytes(count) as usize;

        let expected = count
            .checked_mul(BYTES_PER_FIELD_ELEMENT)
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .ok_or(FrameError::TooShort { len: bytes.len() })?;
        if bytes.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                got: bytes.len(),
            });
        }

        let proof = helpers::deserialize_g1_be(proof_bytes)
            .map_err(|e| FrameError::InvalidPoint(e.to_string()))?;
        let coeffs = body
            .chunks_exact(BYTES_PER_FIELD_ELEMENT)
            .map(|chunk| {
                helpers::fr_from_bytes_be(chunk)
                    .map_err(|e| FrameError::InvalidFieldElement(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { proof, coeffs })
    }
}

impl AsRef<[Fr]> for Frame {
    fn as_ref(&self) -> &[Fr] {
        &self.coeffs
    }
}

/// Encodes a batch of frames, one byte vector per frame.
pub fn encode_frames(frames: &[Frame]) -> Vec<Vec<u8>> {
    frames.iter().map(Frame::encode).collect()
}

pub fn decode_frames<B: AsRef<[u8]>>(frames: &[B]) -> Result<Vec<Frame>, FrameError> {
    frames.iter().map(|b| Frame::decode(b.as_ref())).collect()
}
