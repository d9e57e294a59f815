use ark_bn254::{G1Affine, G2Affine};
use datalayr_primitives::helpers::{keccak256, pack_to, serialize_g1_be, serialize_g2_be};

use crate::{aggregator::AggregateSigs, errors::DisperserError};

const STAKE_HISTORY_INDEX_BYTES: usize = 6;

/// Arguments of `confirmDataStore`, packed by [ConfirmationCalldata::encode].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationCalldata {
    pub msg_hash: [u8; 32],
    pub total_stake_index: u64,
    pub reference_block_number: u32,
    pub store_id: u32,
    pub non_signer_pubkeys: Vec<G1Affine>,
    pub apk_index: u32,
    pub stored_agg_pubkey_g1: G1Affine,
    pub used_agg_pubkey_g2: G2Affine,
    pub agg_sig: G1Affine,
}

impl ConfirmationCalldata {
    pub fn new(
        msg_hash: [u8; 32],
        sigs: &AggregateSigs,
        store_id: u32,
        apk_index: u32,
        total_stake_index: u64,
        reference_block_number: u32,
    ) -> Self {
        Self {
            msg_hash,
            total_stake_index,
            reference_block_number,
            store_id,
            non_signer_pubkeys: sigs.non_signer_pubkeys.clone(),
            apk_index,
            stored_agg_pubkey_g1: sigs.stored_agg_pubkey_g1,
            used_agg_pubkey_g2: sigs.used_agg_pubkey_g2,
            agg_sig: sigs.agg_sig,
        }
    }

    /// ```text
    /// msgHash 32 | totalStakeIndex 6 | refBlock 4 | storeId 4 | numNonSigners 4
    /// | nonSigner (G1 64 + 4 zero bytes)* | apkIndex 4 | storedAggPubkeyG1 64
    /// | usedAggPubkeyG2 128 | aggSig 64
    /// ```
    /// Non-signer keys are sorted ascending by the Keccak hash of their
    /// encoding.
    pub fn encode(&self) -> Result<Vec<u8>, DisperserError> {
        if self.total_stake_index >> (8 * STAKE_HISTORY_INDEX_BYTES) != 0 {
            return Err(DisperserError::FieldOverflow {
                field: "total stake index",
                value: self.total_stake_index,
                bytes: STAKE_HISTORY_INDEX_BYTES,
            });
        }
        let num_non_signers = u32::try_from(self.non_signer_pubkeys.len()).map_err(|_| {
            DisperserError::FieldOverflow {
                field: "non-signer count",
                value: self.non_signer_pubkeys.len() as u64,
                bytes: 4,
            }
        })?;

        let mut calldata = Vec::with_capacity(
            32 + STAKE_HISTORY_INDEX_BYTES + 16 + 68 * self.non_signer_pubkeys.len() + 256,
        );
        calldata.extend_from_slice(&self.msg_hash);
        calldata.extend_from_slice(&pack_to(
            &self.total_stake_index.to_be_bytes(),
            STAKE_HISTORY_INDEX_BYTES,
        ));
        calldata.extend_from_slice(&self.reference_block_number.to_be_bytes());
        calldata.extend_from_slice(&self.store_id.to_be_bytes());
        calldata.extend_from_slice(&num_non_signers.to_be_bytes());
        for pubkey in sorted_non_signer_pubkeys(&self.non_signer_pubkeys) {
            calldata.extend_from_slice(&pubkey);
            calldata.extend_from_slice(&[0u8; 4]);
        }
        calldata.extend_from_slice(&self.apk_index.to_be_bytes());
        calldata.extend_from_slice(&serialize_g1_be(&self.stored_agg_pubkey_g1));
        calldata.extend_from_slice(&serialize_g2_be(&self.used_agg_pubkey_g2));
        calldata.extend_from_slice(&serialize_g1_be(&self.agg_sig));
        Ok(calldata)
    }
}

/// Serialized keys ordered by `keccak256(X || Y)`.
pub fn sorted_non_signer_pubkeys(pubkeys: &[G1Affine]) -> Vec<[u8; 64]> {
    let mut keyed: Vec<([u8; 32], [u8; 64])> = pubkeys
        .iter()
        .map(|pubkey| {
            let bytes = serialize_g1_be(pubkey);
            (keccak256(&bytes), bytes)
        })
        .collect();
    keyed.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, bytes)| bytes).collect()
}
