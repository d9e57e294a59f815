use datalayr_primitives::{
    consts::BYTES_PER_SYMBOL, frame::Frame, header::DataStoreHeader, helpers::keccak256,
};
use num_bigint::BigUint;

use crate::{assignment::ChunkAssignment, errors::DisperserError};

/// Bytes of store bookkeeping charged on top of the frames.
pub const STORE_META_SIZE: u32 = 150;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreRequest {
    /// Reference block; 0 means the current chain head.
    pub block_number: u32,
    pub adv_ratio_bps: u32,
    pub live_ratio_bps: u32,
    pub duration: u8,
    pub data: Vec<u8>,
}

impl StoreRequest {
    pub fn new(
        block_number: u32,
        adv_ratio_bps: u32,
        live_ratio_bps: u32,
        duration: u8,
        data: Vec<u8>,
    ) -> Self {
        Self {
            block_number,
            adv_ratio_bps,
            live_ratio_bps,
            duration,
            data,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreMetadata {
    pub reference_block_number: u32,
    pub total_operators_index: u32,
    pub header_hash: [u8; 32],
    pub duration: u8,
    /// Signing threshold of every quorum, indexed like the quorum stakes.
    pub quorum_thresholds: Vec<BigUint>,
    pub fee: BigUint,
    /// Only known once the init transaction has been observed.
    pub store_id: u32,
    /// Only known once the init transaction has been observed.
    pub msg_hash: [u8; 32],
}

/// An encoded data store ready for dispersal.
#[derive(Clone, Debug, PartialEq)]
pub struct Store {
    pub metadata: StoreMetadata,
    pub header: DataStoreHeader,
    pub header_bytes: Vec<u8>,
    pub frames: Vec<Frame>,
    /// Encoded size of all frames.
    pub total_size: u32,
    /// One assignment per registrant, in registrant order.
    pub assignments: Vec<ChunkAssignment>,
}

impl Store {
    pub fn upper_bound_bytes(&self) -> u64 {
        STORE_META_SIZE as u64 + self.total_size as u64 + 8 * self.assignments.len() as u64
    }
}

/// Event emitted by the service manager once a store is initialised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataStoreInit {
    pub store_number: u32,
    pub data_commitment: [u8; 32],
    pub duration: u8,
    pub init_time: u32,
    pub index: u32,
    pub msg_hash: [u8; 32],
}

/// `keccak(storeNumber | dataCommitment | duration | initTime padded to 32 | index)`,
/// integers big endian.
pub fn get_message_hash(event: &DataStoreInit) -> [u8; 32] {
    let mut msg = Vec::with_capacity(4 + 32 + 1 + 32 + 4);
    msg.extend_from_slice(&event.store_number.to_be_bytes());
    msg.extend_from_slice(&event.data_commitment);
    msg.push(event.duration);
    msg.extend_from_slice(&[0u8; 28]);
    msg.extend_from_slice(&event.init_time.to_be_bytes());
    msg.extend_from_slice(&event.index.to_be_bytes());
    keccak256(&msg)
}

/// Every registrant must receive at least one symbol's worth of data.
pub fn check_data_length(data_len: usize, num_registrants: usize) -> Result<(), DisperserError> {
    let min = BYTES_PER_SYMBOL * num_registrants;
    if data_len < min {
        return Err(DisperserError::InvalidInputLength { len: data_len, min });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_hash_layout() {
        let event = DataStoreInit {
            store_number: 7,
            data_commitment: [0xab; 32],
            duration: 3,
            init_time: 0x0102_0304,
            index: 9,
            msg_hash: [0u8; 32],
        };
        let mut expected = vec![0, 0, 0, 7];
        expected.extend_from_slice(&[0xab; 32]);
        expected.push(3);
        expected.extend_from_slice(&[0u8; 28]);
        expected.extend_from_slice(&[1, 2, 3, 4]);
        expected.extend_from_slice(&[0, 0, 0, 9]);
        assert_eq!(get_message_hash(&event), keccak256(&expected));
    }

    #[test]
    fn test_check_data_length() {
        assert!(check_data_length(31 * 4, 4).is_ok());
        assert_eq!(
            check_data_length(31 * 4 - 1, 4),
            Err(DisperserError::InvalidInputLength { len: 123, min: 124 })
        );
    }
}
