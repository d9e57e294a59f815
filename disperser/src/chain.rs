//! Collaborator traits for the chain and the indexed state view, plus the
//! service-manager client composed over a raw chain client.

use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;
use tracing::{debug, info};

use crate::{
    assignment::StateView,
    errors::DisperserError,
    store::{DataStoreInit, Store},
};

/// Arguments of `initDataStore`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitDataStoreRequest {
    pub duration: u8,
    pub reference_block_number: u32,
    pub total_operators_index: u32,
    pub header: Vec<u8>,
    pub fee: BigUint,
}

/// Transactions and reads against the data layer service manager.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn block_number(&self) -> Result<u64, DisperserError>;

    /// Liveness threshold, in basis points.
    async fn quorum_threshold_bps(&self) -> Result<u32, DisperserError>;

    /// Adversary threshold, in basis points.
    async fn adversary_threshold_bps(&self) -> Result<u32, DisperserError>;

    async fn precommit_fee(&self, duration: u8, total_size: u32) -> Result<BigUint, DisperserError>;

    /// Sends `initDataStore` and returns the transaction hash.
    async fn init_data_store(&self, request: InitDataStoreRequest) -> Result<[u8; 32], DisperserError>;

    async fn confirm_data_store(
        &self,
        calldata: Vec<u8>,
        event: &DataStoreInit,
    ) -> Result<(), DisperserError>;
}

/// Indexed view of operator registrations and store events.
#[async_trait]
pub trait StateViewProvider: Send + Sync {
    async fn state_view(&self, block_number: u32) -> Result<StateView, DisperserError>;

    /// Waits up to `timeout` for the init event emitted by `tx_hash`.
    async fn poll_init_data_store(
        &self,
        tx_hash: &[u8; 32],
        timeout: Duration,
    ) -> Result<Option<DataStoreInit>, DisperserError>;
}

/// Store-level operations of the data layer service manager, built on a raw
/// [ChainClient].
#[derive(Clone, Debug)]
pub struct DataLayrChainClient<C> {
    pub chain: C,
}

impl<C: ChainClient> DataLayrChainClient<C> {
    pub fn new(chain: C) -> Self {
        Self { chain }
    }

    /// Current head, checked to fit the 4-byte block fields.
    pub async fn block_number(&self) -> Result<u32, DisperserError> {
        let block = self.chain.block_number().await?;
        u32::try_from(block).map_err(|_| DisperserError::FieldOverflow {
            field: "block number",
            value: block,
            bytes: 4,
        })
    }

    /// `(live, adversary)` ratios in basis points.
    pub async fn threshold_ratios(&self) -> Result<(u32, u32), DisperserError> {
        let live = self.chain.quorum_threshold_bps().await?;
        let adv = self.chain.adversary_threshold_bps().await?;
        Ok((live, adv))
    }

    pub async fn data_store_fee(&self, duration: u8, total_size: u32) -> Result<BigUint, DisperserError> {
        self.chain.precommit_fee(duration, total_size).await
    }

    pub async fn init_data_store(&self, store: &Store) -> Result<[u8; 32], DisperserError> {
        let request = InitDataStoreRequest {
            duration: store.metadata.duration,
            reference_block_number: store.metadata.reference_block_number,
            total_operators_index: store.metadata.total_operators_index,
            header: store.header_bytes.clone(),
            fee: store.metadata.fee.clone(),
        };
        let tx_hash = self.chain.init_data_store(request).await?;
        info!(
            tx_hash = hex::encode(tx_hash),
            header_hash = hex::encode(store.metadata.header_hash),
            "init data store sent"
        );
        Ok(tx_hash)
    }

    pub async fn confirm_data_store(
        &self,
        calldata: Vec<u8>,
        event: &DataStoreInit,
    ) -> Result<(), DisperserError> {
        debug!(store_number = event.store_number, len = calldata.len(), "confirming data store");
        self.chain.confirm_data_store(calldata, event).await
    }
}
