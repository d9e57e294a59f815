use datalayr_primitives::errors::{EncodingError, HeaderError, KzgError};
use thiserror::Error;

/// Errors raised by BLS key handling and signature parsing.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BlsError {
    #[error("secret key must be non-zero")]
    ZeroSecretKey,

    #[error("invalid signature bytes: {0}")]
    InvalidSignature(String),

    #[error("invalid public key bytes: {0}")]
    InvalidPublicKey(String),
}

/// Errors raised while deriving quorum parameters or chunk assignments.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AssignmentError {
    #[error("no operators registered")]
    NoOperators,

    #[error("total stake of quorum {0} is zero")]
    ZeroTotalStake(usize),

    #[error("quorum {quorum} out of range ({num_quorums} quorums tracked)")]
    QuorumOutOfRange { quorum: usize, num_quorums: usize },

    #[error("liveness ratio {live_bps} must exceed adversary ratio {adv_bps} and be at most 10000 basis points")]
    InvalidRatio { live_bps: u32, adv_bps: u32 },

    #[error("stake distribution leaves no parity chunks (numSys {num_sys}, total chunks {total_chunks})")]
    NoParityChunks { num_sys: u64, total_chunks: u64 },

    #[error("chunk count of operator {operator} overflows; its stake is inconsistent with the quorum total")]
    ChunkCountOverflow { operator: usize },

    #[error("encoding error: {0}")]
    EncodingError(#[from] EncodingError),
}

/// Fatal errors of one aggregation round. Per-operator failures never show
/// up here; they only turn the operator into a non-signer.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AggregatorError {
    #[error("aggregate signature does not verify against the aggregate public key")]
    InvalidAggregateSignature,

    #[error("aggregate G2 public key is inconsistent with the stored G1 key minus non-signers")]
    InconsistentAggregatePubkey,

    #[error("assignment missing for operator {0}")]
    MissingAssignment(usize),

    #[error("assignment of operator {operator} exceeds the {num_frames} frames of the store")]
    AssignmentOutOfRange { operator: usize, num_frames: usize },
}

/// Errors from the coded data cache.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CacheError {
    #[error("coded data cache full: {needed} bytes needed, {available} available")]
    CacheFull { needed: u64, available: u64 },

    #[error("no store cached under header hash {0}")]
    NotFound(String),
}

/// Errors from building zero-polynomial disclosures.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DisclosureError {
    #[error("header error: {0}")]
    HeaderError(#[from] HeaderError),

    #[error("encoding error: {0}")]
    EncodingError(#[from] EncodingError),

    #[error("kzg error: {0}")]
    KzgError(#[from] KzgError),

    #[error("kzg verification fails for the reveal at leading coset {index}")]
    RevealPairingFailed { index: u32 },

    #[error("{num_node} node cosets exceed the {max} supported by the zero polynomial tree")]
    UnsupportedNodeCount { num_node: u64, max: u64 },

    #[error("interpolation polynomial degree {0} must be a power of two")]
    InvalidDegree(u32),

    #[error("merkle tree over zero polynomials is empty")]
    EmptyMerkleTree,
}

/// Failure of one operator request. Absorbed by the aggregator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("operator {socket} failed: {reason}")]
pub struct TransportError {
    pub socket: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum DisperserError {
    #[error("chain client error: {0}")]
    ChainError(String),

    #[error("state view error: {0}")]
    StateViewError(String),

    #[error("not enough participants")]
    NotEnoughParticipants,

    #[error("input of {len} bytes is shorter than the {min} bytes required")]
    InvalidInputLength { len: usize, min: usize },

    #[error("data of {0} bytes does not fit the header")]
    DataTooLarge(usize),

    #[error("encoder produced {got} frames but chain state requires {expected}")]
    InconsistentChainStateFrame { expected: u64, got: usize },

    #[error("timed out waiting for the init data store event")]
    PrecommitTimeout,

    #[error("{field} value {value} does not fit in {bytes} bytes")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        bytes: usize,
    },

    #[error("assignment error: {0}")]
    AssignmentError(#[from] AssignmentError),

    #[error("aggregator error: {0}")]
    AggregatorError(#[from] AggregatorError),

    #[error("cache error: {0}")]
    CacheError(#[from] CacheError),

    #[error("kzg error: {0}")]
    KzgError(#[from] KzgError),

    #[error("encoding error: {0}")]
    EncodingError(#[from] EncodingError),
}
