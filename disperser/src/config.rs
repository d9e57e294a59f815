use std::time::Duration;

use serde::{Deserialize, Serialize};

/// When an aggregation round stops collecting signatures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizationPolicy {
    /// Wait for every operator to answer or for the deadline.
    #[default]
    WaitForAll,
    /// Stop as soon as the signed stake of every tracked quorum reaches its
    /// threshold. Operators that have not answered yet become non-signers.
    StakeThreshold,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Deadline of one collection round.
    pub timeout: Duration,
    pub finalization: FinalizationPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            finalization: FinalizationPolicy::WaitForAll,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedDataCacheConfig {
    pub capacity_bytes: u64,
    pub expire_after: Duration,
    pub clean_period: Duration,
}

impl Default for CodedDataCacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 1 << 30,
            expire_after: Duration::from_secs(600),
            clean_period: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisperserConfig {
    /// Disperser address written into every header.
    pub address: [u8; 20],
    /// Reuse the last encoding when the same payload is dispersed again.
    pub use_cache: bool,
    pub live_ratio_bps: u32,
    pub adv_ratio_bps: u32,
    /// Quorum whose stake distribution sizes the code.
    pub quorum_index: usize,
    /// How long to wait for the init data store event.
    pub precommit_timeout: Duration,
    pub aggregator: AggregatorConfig,
    pub coded_cache: CodedDataCacheConfig,
}

impl Default for DisperserConfig {
    fn default() -> Self {
        Self {
            address: [0u8; 20],
            use_cache: true,
            live_ratio_bps: 9000,
            adv_ratio_bps: 4000,
            quorum_index: 0,
            precommit_timeout: Duration::from_secs(60),
            aggregator: AggregatorConfig::default(),
            coded_cache: CodedDataCacheConfig::default(),
        }
    }
}
