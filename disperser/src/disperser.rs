use std::sync::Arc;

use datalayr_primitives::{
    frame::Frame,
    header::DataStoreHeader,
    helpers::keccak256,
};
use datalayr_prover::group::KzgEncoderGroup;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    aggregator::{AggregateSigs, Aggregator, OperatorClient},
    assignment::{get_operator_assignments, get_quorum_params, quorum_thresholds, QuorumParams, StateView},
    cache::{CachedEncoding, CodedDataCache, StoreCache},
    calldata::ConfirmationCalldata,
    chain::{ChainClient, DataLayrChainClient, StateViewProvider},
    config::DisperserConfig,
    errors::DisperserError,
    store::{check_data_length, Store, StoreMetadata, StoreRequest},
};

/// Result of dispersing a store that was encoded earlier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisperseStoreReply {
    pub sigs: AggregateSigs,
    pub apk_index: u32,
    pub total_stake_index: u32,
}

/// Encodes payloads into stores and drives them through dispersal and
/// confirmation.
pub struct Disperser<C, S, O> {
    pub config: DisperserConfig,
    pub encoders: KzgEncoderGroup,
    pub chain: DataLayrChainClient<C>,
    pub state_views: S,
    pub aggregator: Aggregator<O>,
    store_cache: StoreCache,
    coded_cache: Arc<CodedDataCache>,
}

impl<C, S, O> Disperser<C, S, O>
where
    C: ChainClient,
    S: StateViewProvider,
    O: OperatorClient,
{
    pub fn new(
        config: DisperserConfig,
        encoders: KzgEncoderGroup,
        chain: DataLayrChainClient<C>,
        state_views: S,
        operators: Arc<O>,
    ) -> Self {
        let aggregator = Aggregator::new(operators, config.aggregator.clone());
        let coded_cache = Arc::new(CodedDataCache::new(config.coded_cache.clone()));
        Self {
            config,
            encoders,
            chain,
            state_views,
            aggregator,
            store_cache: StoreCache::new(),
            coded_cache,
        }
    }

    pub fn coded_cache(&self) -> &Arc<CodedDataCache> {
        &self.coded_cache
    }

    /// Starts the background expiry of the coded data cache.
    pub fn start(&self) -> JoinHandle<()> {
        self.coded_cache.start_expire_loop()
    }

    /// A request using the configured threshold ratios.
    pub fn store_request(&self, block_number: u32, duration: u8, data: Vec<u8>) -> StoreRequest {
        StoreRequest::new(
            block_number,
            self.config.adv_ratio_bps,
            self.config.live_ratio_bps,
            duration,
            data,
        )
    }

    /// Encodes `req.data` against the operator set at the reference block and
    /// assigns the frames.
    #[instrument(skip_all, fields(block_number = req.block_number, len = req.data.len()))]
    pub async fn create_store(&self, mut req: StoreRequest) -> Result<(Store, StateView), DisperserError> {
        if req.block_number == 0 {
            req.block_number = self.chain.block_number().await?;
        }

        let state = self.state_views.state_view(req.block_number).await?;
        trace!(
            registrants = state.registrants.len(),
            total_operators_index = state.total_operator.index,
            "state view"
        );
        if state.registrants.is_empty() {
            return Err(DisperserError::NotEnoughParticipants);
        }
        check_data_length(req.data.len(), state.registrants.len())?;

        let params = get_quorum_params(
            req.live_ratio_bps,
            req.adv_ratio_bps,
            &state,
            self.config.quorum_index,
        )?;
        debug!(
            num_sys = params.num_sys,
            num_par = params.num_par,
            stake_threshold = %params.stake_threshold,
            "got quorum params"
        );

        let (frames, header) = self.encode(&req.data, &params)?;
        let header_bytes = header.encode().to_vec();
        let header_hash = header.header_hash();
        trace!(header_hash = hex::encode(header_hash), "data store encoded");

        let assignments = get_operator_assignments(&params, &header_hash);
        let total_size = frames_size(&frames)?;
        let fee = self.chain.data_store_fee(req.duration, total_size).await?;

        let metadata = StoreMetadata {
            reference_block_number: req.block_number,
            total_operators_index: state.total_operator.index,
            header_hash,
            duration: req.duration,
            quorum_thresholds: quorum_thresholds(&state, req.live_ratio_bps),
            fee,
            store_id: 0,
            msg_hash: [0u8; 32],
        };
        let store = Store {
            metadata,
            header,
            header_bytes,
            frames,
            total_size,
            assignments,
        };
        Ok((store, state))
    }

    /// Encodes `data` with the code sized by `params`, reusing the previous
    /// encoding when the payload repeats.
    pub fn encode(
        &self,
        data: &[u8],
        params: &QuorumParams,
    ) -> Result<(Vec<Frame>, DataStoreHeader), DisperserError> {
        let orig_data_size =
            u32::try_from(data.len()).map_err(|_| DisperserError::DataTooLarge(data.len()))?;
        let digest = keccak256(data);

        let cached = if self.config.use_cache {
            self.store_cache.get(&digest, params.num_sys, params.num_par)
        } else {
            None
        };
        let encoding = match cached {
            Some(encoding) => {
                trace!("using cached encoding");
                encoding
            },
            None => {
                let encoder =
                    self.encoders
                        .get_kzg_encoder(params.num_sys, params.num_par, data.len() as u64)?;
                let blob = encoder.encode_bytes(data)?;
                let encoding = CachedEncoding {
                    digest,
                    num_sys: params.num_sys,
                    num_par: params.num_par,
                    commitment: blob.commitment,
                    low_degree_proof: blob.low_degree_proof,
                    frames: blob.frames,
                };
                if self.config.use_cache {
                    self.store_cache.put(encoding.clone());
                }
                encoding
            },
        };

        let expected = params.num_chunks();
        if encoding.frames.len() as u64 != expected {
            error!(
                expected,
                got = encoding.frames.len(),
                "numSys + numPar does not match the number of frames"
            );
            return Err(DisperserError::InconsistentChainStateFrame {
                expected,
                got: encoding.frames.len(),
            });
        }
        let degree = encoding.frames.last().map_or(0, |frame| frame.len() as u32);

        let header = DataStoreHeader {
            kzg_commit: encoding.commitment,
            degree,
            num_sys: params.num_sys as u32,
            num_par: params.num_par as u32,
            orig_data_size,
            disperser: self.config.address,
            low_degree_proof: encoding.low_degree_proof,
        };
        debug!(
            degree,
            num_sys = header.num_sys,
            num_par = header.num_par,
            orig_data_size,
            "data store header built"
        );
        Ok((encoding.frames, header))
    }

    /// Creates a store, initialises it on chain, collects signatures and
    /// confirms it.
    #[instrument(skip_all, fields(len = req.data.len()))]
    pub async fn disperse(&self, req: StoreRequest) -> Result<(Store, AggregateSigs), DisperserError> {
        let (mut store, state) = self.create_store(req).await?;
        info!(
            header_hash = hex::encode(store.metadata.header_hash),
            total_operators_index = store.metadata.total_operators_index,
            block_number = store.metadata.reference_block_number,
            "data store encoded"
        );

        let tx_hash = self.chain.init_data_store(&store).await?;
        let event = self
            .state_views
            .poll_init_data_store(&tx_hash, self.config.precommit_timeout)
            .await?
            .ok_or(DisperserError::PrecommitTimeout)?;
        trace!(msg_hash = hex::encode(event.msg_hash), "init data store event received");

        store.metadata.store_id = event.store_number;
        store.metadata.msg_hash = event.msg_hash;

        let sigs = self
            .aggregator
            .aggregate(&store, &state)
            .await
            .inspect_err(|err| warn!(error = %err, "failed to aggregate signatures"))?;

        let calldata = ConfirmationCalldata::new(
            event.msg_hash,
            &sigs,
            store.metadata.store_id,
            state.total_operator.index,
            state.total_stake.index as u64,
            store.metadata.reference_block_number,
        )
        .encode()?;
        self.chain.confirm_data_store(calldata, &event).await?;
        Ok((store, sigs))
    }

    /// Encodes a store with the chain's current threshold ratios and parks
    /// it in the coded data cache until [Disperser::disperse_store].
    #[instrument(skip_all, fields(block_number = block_number, len = data.len()))]
    pub async fn encode_store(
        &self,
        block_number: u32,
        duration: u8,
        data: Vec<u8>,
    ) -> Result<Arc<Store>, DisperserError> {
        let (live, adv) = self.chain.threshold_ratios().await?;
        let req = StoreRequest::new(block_number, adv, live, duration, data);
        let (store, _) = self.create_store(req).await?;
        Ok(self.coded_cache.add(store)?)
    }

    /// Disperses a cached store under `msg_hash` and evicts it.
    #[instrument(skip_all, fields(header_hash = hex::encode(header_hash)))]
    pub async fn disperse_store(
        &self,
        header_hash: &[u8; 32],
        msg_hash: [u8; 32],
    ) -> Result<DisperseStoreReply, DisperserError> {
        let cached = self.coded_cache.get(header_hash)?;
        let state = self
            .state_views
            .state_view(cached.metadata.reference_block_number)
            .await?;

        let mut store = Store::clone(&cached);
        store.metadata.msg_hash = msg_hash;
        let sigs = self
            .aggregator
            .aggregate(&store, &state)
            .await
            .inspect_err(|err| error!(error = %err, "could not aggregate signatures"))?;

        self.coded_cache.delete(header_hash);
        Ok(DisperseStoreReply {
            sigs,
            apk_index: state.total_operator.index,
            total_stake_index: state.total_stake.index,
        })
    }
}

fn frames_size(frames: &[Frame]) -> Result<u32, DisperserError> {
    let total: usize = frames.iter().map(Frame::encoded_len).sum();
    u32::try_from(total).map_err(|_| DisperserError::DataTooLarge(total))
}
