#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use ark_bn254::{Fr, G1Affine, G1Projective};
    use ark_ec::{AffineRepr, CurveGroup};
    use async_trait::async_trait;
    use datalayr_disperser::{
        aggregator::{Aggregator, OperatorClient},
        assignment::{
            get_operator_assignments, get_quorum_params, quorum_thresholds, OperatorView,
            StateView, TotalOperatorView, TotalStakeView,
        },
        bls::{aggregate_g1, aggregate_g2, verify_signature, KeyPair},
        config::{AggregatorConfig, FinalizationPolicy},
        errors::{AggregatorError, TransportError},
        store::{Store, StoreMetadata},
    };
    use datalayr_primitives::{frame::Frame, header::DataStoreHeader, helpers::serialize_g1_be};
    use num_bigint::BigUint;

    const MSG_HASH: [u8; 32] = [0x42; 32];

    #[derive(Clone)]
    enum Behavior {
        Sign,
        SignWith(KeyPair),
        Fail,
        Garbage,
        Delay(Duration),
    }

    struct MockOperators {
        keys: HashMap<String, KeyPair>,
        behaviors: HashMap<String, Behavior>,
        received: Mutex<HashMap<String, usize>>,
    }

    #[async_trait]
    impl OperatorClient for MockOperators {
        async fn store_frames(
            &self,
            socket: &str,
            msg_hash: [u8; 32],
            frames: Vec<Vec<u8>>,
        ) -> Result<Vec<u8>, TransportError> {
            self.received
                .lock()
                .unwrap()
                .insert(socket.to_string(), frames.len());
            let keys = &self.keys[socket];
            let sign = |pair: &KeyPair| serialize_g1_be(&pair.sign(&msg_hash)).to_vec();
            match self.behaviors.get(socket).cloned().unwrap_or(Behavior::Sign) {
                Behavior::Sign => Ok(sign(keys)),
                Behavior::SignWith(other) => Ok(sign(&other)),
                Behavior::Fail => Err(TransportError {
                    socket: socket.to_string(),
                    reason: "connection refused".to_string(),
                }),
                Behavior::Garbage => Ok(vec![0xff; 64]),
                Behavior::Delay(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(sign(keys))
                },
            }
        }
    }

    struct Fixture {
        pairs: Vec<KeyPair>,
        state: StateView,
        store: Store,
    }

    fn socket(i: usize) -> String {
        format!("10.0.0.{i}:32001")
    }

    fn fixture(stakes: &[u64]) -> Fixture {
        let pairs: Vec<KeyPair> = (0..stakes.len())
            .map(|i| KeyPair::from_secret(Fr::from(1000 + i as u64)).unwrap())
            .collect();
        let registrants: Vec<OperatorView> = pairs
            .iter()
            .zip(stakes)
            .enumerate()
            .map(|(i, (pair, stake))| OperatorView {
                address: [i as u8; 20],
                socket: socket(i),
                pubkey_g1: pair.pubkey_g1,
                pubkey_g2: pair.pubkey_g2,
                quorum_stakes: vec![BigUint::from(*stake)],
            })
            .collect();
        let state = StateView {
            total_operator: TotalOperatorView {
                index: 1,
                agg_pubkey_g1: aggregate_g1(&pairs.iter().map(|p| p.pubkey_g1).collect::<Vec<_>>()),
            },
            total_stake: TotalStakeView {
                index: 2,
                quorum_stakes: vec![stakes.iter().map(|s| BigUint::from(*s)).sum()],
            },
            registrants,
        };

        let params = get_quorum_params(9000, 4000, &state, 0).unwrap();
        let header_hash = [0x17; 32];
        let assignments = get_operator_assignments(&params, &header_hash);
        let frames: Vec<Frame> = (0..params.num_chunks())
            .map(|i| Frame::new(G1Affine::identity(), vec![Fr::from(i), Fr::from(i + 1)]))
            .collect();
        let store = Store {
            metadata: StoreMetadata {
                reference_block_number: 10,
                total_operators_index: 1,
                header_hash,
                duration: 1,
                quorum_thresholds: quorum_thresholds(&state, 9000),
                fee: BigUint::from(0u32),
                store_id: 3,
                msg_hash: MSG_HASH,
            },
            header: DataStoreHeader {
                kzg_commit: G1Affine::identity(),
                degree: 2,
                num_sys: params.num_sys as u32,
                num_par: params.num_par as u32,
                orig_data_size: 62,
                disperser: [0u8; 20],
                low_degree_proof: G1Affine::identity(),
            },
            header_bytes: vec![],
            total_size: 0,
            frames,
            assignments,
        };
        Fixture { pairs, state, store }
    }

    fn operators(pairs: &[KeyPair], behaviors: Vec<(usize, Behavior)>) -> Arc<MockOperators> {
        Arc::new(MockOperators {
            keys: pairs
                .iter()
                .enumerate()
                .map(|(i, pair)| (socket(i), pair.clone()))
                .collect(),
            behaviors: behaviors
                .into_iter()
                .map(|(i, behavior)| (socket(i), behavior))
                .collect(),
            received: Mutex::new(HashMap::new()),
        })
    }

    fn config(timeout: Duration, finalization: FinalizationPolicy) -> AggregatorConfig {
        AggregatorConfig {
            timeout,
            finalization,
        }
    }

    #[tokio::test]
    async fn test_all_operators_sign() {
        let fx = fixture(&[1, 2, 3, 4]);
        let client = operators(&fx.pairs, vec![]);
        let aggregator = Aggregator::new(client.clone(), AggregatorConfig::default());

        let sigs = aggregator.aggregate(&fx.store, &fx.state).await.unwrap();
        assert!(sigs.non_signer_pubkeys.is_empty());
        assert_eq!(
            sigs.used_agg_pubkey_g2,
            aggregate_g2(&fx.pairs.iter().map(|p| p.pubkey_g2).collect::<Vec<_>>())
        );
        assert_eq!(sigs.stored_agg_pubkey_g1, fx.state.total_operator.agg_pubkey_g1);
        assert!(verify_signature(&sigs.agg_sig, &sigs.used_agg_pubkey_g2, &MSG_HASH));

        // every operator received exactly its assigned frames
        let received = client.received.lock().unwrap();
        for (i, assignment) in fx.store.assignments.iter().enumerate() {
            assert_eq!(received[&socket(i)] as u64, assignment.num_chunks);
        }
    }

    #[tokio::test]
    async fn test_failures_become_non_signers() {
        let fx = fixture(&[1, 1, 1, 1, 1]);
        let impostor = KeyPair::from_secret(Fr::from(99u64)).unwrap();
        let client = operators(
            &fx.pairs,
            vec![
                (1, Behavior::Fail),
                (2, Behavior::SignWith(impostor)),
                (4, Behavior::Garbage),
            ],
        );
        let aggregator = Aggregator::new(client, AggregatorConfig::default());

        let sigs = aggregator.aggregate(&fx.store, &fx.state).await.unwrap();
        assert_eq!(
            sigs.non_signer_pubkeys,
            vec![fx.pairs[1].pubkey_g1, fx.pairs[2].pubkey_g1, fx.pairs[4].pubkey_g1]
        );
        assert_eq!(
            sigs.used_agg_pubkey_g2,
            aggregate_g2(&[fx.pairs[0].pubkey_g2, fx.pairs[3].pubkey_g2])
        );
        assert!(verify_signature(&sigs.agg_sig, &sigs.used_agg_pubkey_g2, &MSG_HASH));
    }

    #[tokio::test]
    async fn test_late_operator_is_cut_off_at_deadline() {
        let fx = fixture(&[1, 1, 1]);
        let client = operators(&fx.pairs, vec![(0, Behavior::Delay(Duration::from_secs(30)))]);
        let aggregator = Aggregator::new(
            client,
            config(Duration::from_millis(300), FinalizationPolicy::WaitForAll),
        );

        let start = Instant::now();
        let sigs = aggregator.aggregate(&fx.store, &fx.state).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(sigs.non_signer_pubkeys, vec![fx.pairs[0].pubkey_g1]);
    }

    #[tokio::test]
    async fn test_stake_threshold_finalizes_early() {
        let mut fx = fixture(&[1, 1, 1, 1]);
        fx.store.metadata.quorum_thresholds = vec![BigUint::from(3u32)];
        let client = operators(&fx.pairs, vec![(3, Behavior::Delay(Duration::from_secs(30)))]);
        let aggregator = Aggregator::new(
            client,
            config(Duration::from_secs(60), FinalizationPolicy::StakeThreshold),
        );

        let start = Instant::now();
        let sigs = aggregator.aggregate(&fx.store, &fx.state).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(sigs.non_signer_pubkeys, vec![fx.pairs[3].pubkey_g1]);
        assert!(verify_signature(&sigs.agg_sig, &sigs.used_agg_pubkey_g2, &MSG_HASH));
    }

    #[tokio::test]
    async fn test_wait_for_all_collects_slow_operators() {
        let mut fx = fixture(&[1, 1, 1, 1]);
        fx.store.metadata.quorum_thresholds = vec![BigUint::from(3u32)];
        let client = operators(&fx.pairs, vec![(3, Behavior::Delay(Duration::from_millis(200)))]);
        let aggregator = Aggregator::new(
            client,
            config(Duration::from_secs(30), FinalizationPolicy::WaitForAll),
        );

        let sigs = aggregator.aggregate(&fx.store, &fx.state).await.unwrap();
        assert!(sigs.non_signer_pubkeys.is_empty());
    }

    #[tokio::test]
    async fn test_no_signers() {
        let fx = fixture(&[1, 1]);
        let client = operators(&fx.pairs, vec![(0, Behavior::Fail), (1, Behavior::Fail)]);
        let aggregator = Aggregator::new(client, AggregatorConfig::default());

        let sigs = aggregator.aggregate(&fx.store, &fx.state).await.unwrap();
        assert_eq!(sigs.non_signer_pubkeys.len(), 2);
        assert!(sigs.agg_sig.is_zero());
        assert!(sigs.used_agg_pubkey_g2.is_zero());
    }

    #[tokio::test]
    async fn test_inconsistent_stored_pubkey_is_fatal() {
        let mut fx = fixture(&[1, 1, 1]);
        fx.state.total_operator.agg_pubkey_g1 =
            (G1Projective::from(fx.state.total_operator.agg_pubkey_g1) + G1Affine::generator())
                .into_affine();
        let client = operators(&fx.pairs, vec![]);
        let aggregator = Aggregator::new(client, AggregatorConfig::default());

        assert_eq!(
            aggregator.aggregate(&fx.store, &fx.state).await,
            Err(AggregatorError::InconsistentAggregatePubkey)
        );
    }

    #[tokio::test]
    async fn test_malformed_store_fails_before_dispatch() {
        let mut fx = fixture(&[1, 1, 1]);
        let client = operators(&fx.pairs, vec![]);
        let aggregator = Aggregator::new(client.clone(), AggregatorConfig::default());

        fx.store.assignments.pop();
        assert_eq!(
            aggregator.aggregate(&fx.store, &fx.state).await,
            Err(AggregatorError::MissingAssignment(2))
        );

        let mut fx = fixture(&[1, 1, 1]);
        fx.store.frames.truncate(1);
        assert!(matches!(
            aggregator.aggregate(&fx.store, &fx.state).await,
            Err(AggregatorError::AssignmentOutOfRange { num_frames: 1, .. })
        ));
        assert!(client.received.lock().unwrap().is_empty());
    }
}
