use ark_bn254::G1Affine;

extern crate alloc;
use alloc::string::ToString;

use crate::{
    consts::{DATA_STORE_HEADER_SIZE, DISPERSER_ADDRESS_SIZE, SIZE_OF_G1_AFFINE_UNCOMPRESSED},
    errors::HeaderError,
    helpers,
    params::EncodingParams,
};

/// Header posted on chain for every data store.
///
/// Layout, all big endian:
/// `KzgCommit[64] | Degree u32 | NumSys u32 | NumPar u32 | OrigDataSize u32 |
/// Disperser[20] | LowDegreeProof[64]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataStoreHeader {
    pub kzg_commit: G1Affine,
    /// Chunk length, i.e. the number of coefficients in every frame.
    pub degree: u32,
    pub num_sys: u32,
    pub num_par: u32,
    pub orig_data_size: u32,
    pub disperser: [u8; DISPERSER_ADDRESS_SIZE],
    pub low_degree_proof: G1Affine,
}

impl DataStoreHeader {
    pub fn encode(&self) -> [u8; DATA_STORE_HEADER_SIZE] {
        let mut out = [0u8; DATA_STORE_HEADER_SIZE];
        let mut offset = 0;
        let mut put = |bytes: &[u8]| {
            out[offset..offset + bytes.len()].copy_from_slice(bytes);
            offset += bytes.len();
        };
        put(&helpers::serialize_g1_be(&self.kzg_commit));
        put(&self.degree.to_be_bytes());
        put(&self.num_sys.to_be_bytes());
        put(&self.num_par.to_be_bytes());
        put(&self.orig_data_size.to_be_bytes());
        put(&self.disperser);
        put(&helpers::serialize_g1_be(&self.low_degree_proof));
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() != DATA_STORE_HEADER_SIZE {
            return Err(HeaderError::InvalidLength {
                expected: DATA_STORE_HEADER_SIZE,
                got: bytes.len(),
            });
        }
        let mut reader = Reader { bytes, offset: 0 };

        let kzg_commit = helpers::deserialize_g1_be(reader.take(SIZE_OF_G1_AFFINE_UNCOMPRESSED))
            .map_err(|e| HeaderError::InvalidPoint(e.to_string()))?;
        let degree = reader.u32();
        let num_sys = reader.u32();
        let num_par = reader.u32();
        let orig_data_size = reader.u32();
        let mut disperser = [0u8; DISPERSER_ADDRESS_SIZE];
        disperser.copy_from_slice(reader.take(DISPERSER_ADDRESS_SIZE));
        let low_degree_proof =
            helpers::deserialize_g1_be(reader.take(SIZE_OF_G1_AFFINE_UNCOMPRESSED))
                .map_err(|e| HeaderError::InvalidPoint(e.to_string()))?;

        Ok(Self {
            kzg_commit,
            degree,
            num_sys,
            num_par,
            orig_data_size,
            disperser,
            low_degree_proof,
        })
    }

    /// Keccak-256 of the encoded header. Keys the coded data cache and seeds
    /// the operator permutation.
    pub fn header_hash(&self) -> [u8; 32] {
        helpers::keccak256(&self.encode())
    }

    pub fn encoding_params(&self) -> Result<EncodingParams, HeaderError> {
        Ok(EncodingParams::new(
            self.num_sys as u64,
            self.num_par as u64,
            self.orig_data_size as u64,
        )?)
    }

    /// Node-side consistency checks: the header's code rate matches the one
    /// derived from chain state, the degree matches the chunk length implied
    /// by the original data size, and the received frames have that length.
    pub fn validate(
        &self,
        expected_num_sys: u64,
        expected_num_par: u64,
        frame_len: u32,
    ) -> Result<(), HeaderError> {
        if self.num_sys as u64 != expected_num_sys {
            return Err(HeaderError::InconsistentNumSys {
                header: self.num_sys,
                expected: expected_num_sys,
            });
        }
        if self.num_par as u64 != expected_num_par {
            return Err(HeaderError::InconsistentNumPar {
                header: self.num_par,
                expected: expected_num_par,
            });
        }
        let params = self.encoding_params()?;
        if self.degree as u64 != params.chunk_len {
            return Err(HeaderError::InconsistentDegreeAndOrigDataSize {
                degree: self.degree,
                expected: params.chunk_len,
            });
        }
        if self.degree != frame_len {
            return Err(HeaderError::InconsistentFrameLength {
                degree: self.degree,
                frame_len,
            });
        }
        Ok(())
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    // callers check the total length up front
    fn take(&mut self, n: usize) -> &'a [u8] {
        let out = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        out
    }

    fn u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4));
        u32::from_be_bytes(buf)
    }
}

