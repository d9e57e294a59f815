//! Dispatches frames to operators and aggregates their BLS attestations.
//!
//! A round moves through `Dispatching -> Collecting -> (Sufficient |
//! TimedOut) -> Finalized`. Every operator gets one task; failures of a
//! single operator, whether transport errors, bad signatures or missed
//! deadlines, only make it a non-signer. Finalization checks the aggregate
//! signature and the aggregate key against the key stored on chain.

use std::collections::HashSet;
use std::sync::Arc;

use ark_bn254::{G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::CurveGroup;
use ark_ff::Zero;
use async_trait::async_trait;
use num_bigint::BigUint;
use tokio::{
    sync::mpsc,
    task::JoinSet,
    time::{timeout_at, Instant},
};
use tracing::{debug, instrument, trace, warn};

use crate::{
    assignment::StateView,
    bls::{check_g1_g2_dleq, signature_from_bytes, verify_signature},
    config::{AggregatorConfig, FinalizationPolicy},
    errors::{AggregatorError, TransportError},
    store::Store,
};

/// Endpoint of a storage operator.
#[async_trait]
pub trait OperatorClient: Send + Sync + 'static {
    /// Hands `frames` to the operator at `socket` and returns its signature
    /// over `msg_hash`, 64 bytes `X || Y`.
    async fn store_frames(
        &self,
        socket: &str,
        msg_hash: [u8; 32],
        frames: Vec<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateSigs {
    /// Aggregate G1 key of all registrants, as stored on chain.
    pub stored_agg_pubkey_g1: G1Affine,
    /// Sum of the G2 keys of the signers.
    pub used_agg_pubkey_g2: G2Affine,
    /// G1 keys of the registrants that did not sign, in registrant order.
    pub non_signer_pubkeys: Vec<G1Affine>,
    pub agg_sig: G1Affine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregationPhase {
    Dispatching,
    Collecting,
    /// Every tracked quorum reached its threshold before all replies came in.
    Sufficient,
    TimedOut,
    Finalized,
}

#[derive(Debug)]
struct SendResult {
    operator: usize,
    result: Result<Vec<u8>, TransportError>,
}

/// Signatures collected in one round.
#[derive(Debug)]
struct Collected {
    signers: HashSet<usize>,
    agg_sig: G1Projective,
    agg_pubkey_g2: G2Projective,
    signed_stake: Vec<BigUint>,
    phase: AggregationPhase,
}

impl Collected {
    fn new(num_quorums: usize) -> Self {
        Self {
            signers: HashSet::new(),
            agg_sig: G1Projective::zero(),
            agg_pubkey_g2: G2Projective::zero(),
            signed_stake: vec![BigUint::zero(); num_quorums],
            phase: AggregationPhase::Collecting,
        }
    }

    fn threshold_met(&self, thresholds: &[BigUint]) -> bool {
        !thresholds.is_empty()
            && thresholds
                .iter()
                .zip(&self.signed_stake)
                .all(|(threshold, signed)| signed >= threshold)
    }
}

#[derive(Debug)]
pub struct Aggregator<O> {
    client: Arc<O>,
    config: AggregatorConfig,
}

impl<O: OperatorClient> Aggregator<O> {
    pub fn new(client: Arc<O>, config: AggregatorConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Runs one full round for `store` against the operator set in `state`.
    #[instrument(skip_all, fields(store_id = store.metadata.store_id, operators = state.registrants.len()))]
    pub async fn aggregate(
        &self,
        store: &Store,
        state: &StateView,
    ) -> Result<AggregateSigs, AggregatorError> {
        let n = state.registrants.len();
        let (sender, receiver) = mpsc::channel(n.max(1));
        let mut tasks = self.disperse_store(store, state, sender)?;
        let collected = self
            .aggregate_signatures(store, state, receiver, &mut tasks)
            .await;
        finalize(store, state, collected)
    }

    /// Spawns one dispatch task per registrant. Assignments are resolved up
    /// front so a malformed store fails before anything is sent.
    fn disperse_store(
        &self,
        store: &Store,
        state: &StateView,
        sender: mpsc::Sender<SendResult>,
    ) -> Result<JoinSet<()>, AggregatorError> {
        trace!(phase = ?AggregationPhase::Dispatching, "dispatching frames");
        let mut requests = Vec::with_capacity(state.registrants.len());
        for (operator, registrant) in state.registrants.iter().enumerate() {
            let assignment = store
                .assignments
                .get(operator)
                .ok_or(AggregatorError::MissingAssignment(operator))?;
            let frames = assignment
                .indices()
                .map(|index| {
                    store
                        .frames
                        .get(index as usize)
                        .map(|frame| frame.encode())
                        .ok_or(AggregatorError::AssignmentOutOfRange {
                            operator,
                            num_frames: store.frames.len(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            requests.push((operator, registrant.socket.clone(), frames));
        }

        let msg_hash = store.metadata.msg_hash;
        let mut tasks = JoinSet::new();
        for (operator, socket, frames) in requests {
            let client = Arc::clone(&self.client);
            let sender = sender.clone();
            tasks.spawn(async move {
                let result = client.store_frames(&socket, msg_hash, frames).await;
                // the receiver is gone once the round has finished
                let _ = sender.send(SendResult { operator, result }).await;
            });
        }
        Ok(tasks)
    }

    /// Drains replies until every operator answered, the deadline passed or,
    /// under [FinalizationPolicy::StakeThreshold], every tracked quorum is
    /// satisfied. Tasks still running afterwards are aborted.
    async fn aggregate_signatures(
        &self,
        store: &Store,
        state: &StateView,
        mut receiver: mpsc::Receiver<SendResult>,
        tasks: &mut JoinSet<()>,
    ) -> Collected {
        let deadline = Instant::now() + self.config.timeout;
        let thresholds = &store.metadata.quorum_thresholds;
        let mut collected = Collected::new(state.num_quorums());

        for _ in 0..state.registrants.len() {
            let reply = match timeout_at(deadline, receiver.recv()).await {
                Ok(Some(reply)) => reply,
                Ok(None) => break,
                Err(_) => {
                    collected.phase = AggregationPhase::TimedOut;
                    break;
                },
            };
            accept_reply(store, state, reply, &mut collected);

            if self.config.finalization == FinalizationPolicy::StakeThreshold
                && collected.threshold_met(thresholds)
            {
                collected.phase = AggregationPhase::Sufficient;
                break;
            }
        }

        tasks.abort_all();
        while tasks.join_next().await.is_some() {}

        debug!(
            phase = ?collected.phase,
            signers = collected.signers.len(),
            non_signers = state.registrants.len() - collected.signers.len(),
            "signature collection finished"
        );
        collected
    }
}

fn accept_reply(store: &Store, state: &StateView, reply: SendResult, collected: &mut Collected) {
    let SendResult { operator, result } = reply;
    let Some(registrant) = state.registrants.get(operator) else {
        return;
    };
    let sig_bytes = match result {
        Ok(sig_bytes) => sig_bytes,
        Err(err) => {
            warn!(operator, error = %err, "send failed");
            return;
        },
    };
    let sig = match signature_from_bytes(&sig_bytes) {
        Ok(sig) => sig,
        Err(err) => {
            warn!(operator, socket = %registrant.socket, error = %err, "cannot parse signature");
            return;
        },
    };
    if !verify_signature(&sig, &registrant.pubkey_g2, &store.metadata.msg_hash) {
        warn!(
            operator,
            socket = %registrant.socket,
            header_hash = hex::encode(store.metadata.header_hash),
            "cannot verify bls signature"
        );
        return;
    }
    if !collected.signers.insert(operator) {
        return;
    }
    trace!(operator, "valid signature received");

    collected.agg_sig += sig;
    collected.agg_pubkey_g2 += registrant.pubkey_g2;
    for (signed, stake) in collected
        .signed_stake
        .iter_mut()
        .zip(&registrant.quorum_stakes)
    {
        *signed += stake;
    }
}

fn finalize(
    store: &Store,
    state: &StateView,
    collected: Collected,
) -> Result<AggregateSigs, AggregatorError> {
    let agg_sig = collected.agg_sig.into_affine();
    let used_agg_pubkey_g2 = collected.agg_pubkey_g2.into_affine();

    if !verify_signature(&agg_sig, &used_agg_pubkey_g2, &store.metadata.msg_hash) {
        warn!("aggregate signature does not verify");
        return Err(AggregatorError::InvalidAggregateSignature);
    }

    let non_signer_pubkeys: Vec<G1Affine> = state
        .registrants
        .iter()
        .enumerate()
        .filter(|(operator, _)| !collected.signers.contains(operator))
        .map(|(_, registrant)| registrant.pubkey_g1)
        .collect();

    let stored_agg_pubkey_g1 = state.total_operator.agg_pubkey_g1;
    let signers_pubkey_g1 = non_signer_pubkeys
        .iter()
        .fold(G1Projective::from(stored_agg_pubkey_g1), |acc, pubkey| acc - pubkey)
        .into_affine();
    if !check_g1_g2_dleq(&signers_pubkey_g1, &used_agg_pubkey_g2) {
        warn!("stored aggregate key minus non-signers differs from the signers' G2 key");
        return Err(AggregatorError::InconsistentAggregatePubkey);
    }

    debug!(
        phase = ?AggregationPhase::Finalized,
        store_id = store.metadata.store_id,
        non_signers = non_signer_pubkeys.len(),
        signed_stake = ?collected.signed_stake,
        "signatures aggregated"
    );
    Ok(AggregateSigs {
        stored_agg_pubkey_g1,
        used_agg_pubkey_g2,
        non_signer_pubkeys,
        agg_sig,
    })
}
