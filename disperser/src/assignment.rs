//! Stake-weighted sizing of the code and assignment of chunk ranges to
//! operators.
//!
//! Everything here is a pure function of a stake snapshot and a header hash,
//! so any party holding both recomputes the same assignment.

use std::ops::Range;

use ark_bn254::{G1Affine, G2Affine};
use datalayr_primitives::consts::BASIS_POINTS;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::errors::AssignmentError;

/// One registered operator at the reference block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorView {
    pub address: [u8; 20],
    pub socket: String,
    pub pubkey_g1: G1Affine,
    pub pubkey_g2: G2Affine,
    /// Stake per quorum.
    pub quorum_stakes: Vec<BigUint>,
}

/// Aggregate operator key as stored on chain, with its history index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TotalOperatorView {
    pub index: u32,
    pub agg_pubkey_g1: G1Affine,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TotalStakeView {
    pub index: u32,
    pub quorum_stakes: Vec<BigUint>,
}

/// Snapshot of the operator set at a reference block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateView {
    pub registrants: Vec<OperatorView>,
    pub total_operator: TotalOperatorView,
    pub total_stake: TotalStakeView,
}

impl StateView {
    pub fn num_quorums(&self) -> usize {
        self.total_stake.quorum_stakes.len()
    }

    pub fn registrant_by_address(&self, address: &[u8; 20]) -> Option<(usize, &OperatorView)> {
        self.registrants
            .iter()
            .enumerate()
            .find(|(_, registrant)| &registrant.address == address)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuorumParams {
    pub stake_threshold: BigUint,
    pub num_sys: u64,
    pub num_par: u64,
    /// Chunk count of every registrant, in registrant order.
    pub chunks_by_operator: Vec<u64>,
}

impl QuorumParams {
    pub fn num_chunks(&self) -> u64 {
        self.num_sys + self.num_par
    }
}

/// Contiguous range of linear chunk positions held by one operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkAssignment {
    pub chunk_index: u64,
    pub num_chunks: u64,
}

impl ChunkAssignment {
    pub fn indices(&self) -> Range<u64> {
        self.chunk_index..self.chunk_index + self.num_chunks
    }
}

fn ceil_div(numerator: &BigUint, denominator: &BigUint) -> BigUint {
    (numerator + denominator - 1u32) / denominator
}

/// Sizes the code for one quorum.
///
/// `numSys = ceil((live - adv) * n / 10000)`; operator `i` holds
/// `ceil(n * stake_i / totalStake)` chunks and the parity count absorbs the
/// rounding; the stake threshold is `ceil(totalStake * live / 10000)`.
pub fn get_quorum_params(
    live_ratio_bps: u32,
    adv_ratio_bps: u32,
    state: &StateView,
    quorum_index: usize,
) -> Result<QuorumParams, AssignmentError> {
    let n = state.registrants.len() as u64;
    if n == 0 {
        return Err(AssignmentError::NoOperators);
    }
    if live_ratio_bps as u64 > BASIS_POINTS || live_ratio_bps <= adv_ratio_bps {
        return Err(AssignmentError::InvalidRatio {
            live_bps: live_ratio_bps,
            adv_bps: adv_ratio_bps,
        });
    }
    let total_stake = state
        .total_stake
        .quorum_stakes
        .get(quorum_index)
        .ok_or(AssignmentError::QuorumOutOfRange {
            quorum: quorum_index,
            num_quorums: state.num_quorums(),
        })?;
    if total_stake.is_zero() {
        return Err(AssignmentError::ZeroTotalStake(quorum_index));
    }

    let num_sys = ((live_ratio_bps - adv_ratio_bps) as u64 * n).div_ceil(BASIS_POINTS);

    let n_big = BigUint::from(n);
    let chunks_by_operator = state
        .registrants
        .iter()
        .enumerate()
        .map(|(operator, registrant)| {
            let stake = registrant
                .quorum_stakes
                .get(quorum_index)
                .cloned()
                .unwrap_or_default();
            ceil_div(&(&n_big * stake), total_stake)
                .to_u64()
                .ok_or(AssignmentError::ChunkCountOverflow { operator })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total_chunks = chunks_by_operator
        .iter()
        .enumerate()
        .try_fold(0u64, |total, (operator, chunks)| {
            total
                .checked_add(*chunks)
                .ok_or(AssignmentError::ChunkCountOverflow { operator })
        })?;
    let num_par = match total_chunks.checked_sub(num_sys) {
        Some(num_par) if num_par > 0 => num_par,
        _ => {
            return Err(AssignmentError::NoParityChunks {
                num_sys,
                total_chunks,
            })
        },
    };

    let stake_threshold = stake_threshold(total_stake, live_ratio_bps);

    Ok(QuorumParams {
        stake_threshold,
        num_sys,
        num_par,
        chunks_by_operator,
    })
}

/// `ceil(totalStake * live / 10000)`, the stake that must sign.
pub fn stake_threshold(total_stake: &BigUint, live_ratio_bps: u32) -> BigUint {
    ceil_div(
        &(total_stake * BigUint::from(live_ratio_bps)),
        &BigUint::from(BASIS_POINTS),
    )
}

/// Thresholds of every quorum tracked by `state`.
pub fn quorum_thresholds(state: &StateView, live_ratio_bps: u32) -> Vec<BigUint> {
    state
        .total_stake
        .quorum_stakes
        .iter()
        .map(|total| stake_threshold(total, live_ratio_bps))
        .collect()
}

/// `headerHash mod n`, the rotation applied to the operator order.
pub fn header_hash_offset(header_hash: &[u8; 32], num_operators: u64) -> u64 {
    if num_operators == 0 {
        return 0;
    }
    (BigUint::from_bytes_be(header_hash) % num_operators)
        .to_u64()
        .unwrap_or(0)
}

/// Assigns contiguous chunk ranges in the order of the rotated operator
/// slots: operator `i` sits at slot `(i + headerHash mod n) mod n`. The
/// result is indexed by registrant position.
pub fn get_operator_assignments(
    params: &QuorumParams,
    header_hash: &[u8; 32],
) -> Vec<ChunkAssignment> {
    let n = params.chunks_by_operator.len() as u64;
    let offset = header_hash_offset(header_hash, n);

    let mut assignments = vec![ChunkAssignment::default(); n as usize];
    let mut next_index = 0;
    for slot in 0..n {
        let operator = ((slot + n - offset) % n) as usize;
        let num_chunks = params.chunks_by_operator[operator];
        assignments[operator] = ChunkAssignment {
            chunk_index: next_index,
            num_chunks,
        };
        next_index += num_chunks;
    }
    assignments
}
