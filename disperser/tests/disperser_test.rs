#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use ark_bn254::Fr;
    use async_trait::async_trait;
    use datalayr_disperser::{
        aggregator::OperatorClient,
        assignment::{OperatorView, StateView, TotalOperatorView, TotalStakeView},
        bls::{aggregate_g1, verify_signature, KeyPair},
        chain::{ChainClient, DataLayrChainClient, InitDataStoreRequest, StateViewProvider},
        config::DisperserConfig,
        disperser::Disperser,
        errors::{CacheError, DisperserError, TransportError},
        store::{get_message_hash, DataStoreInit},
    };
    use datalayr_primitives::{
        frame::encode_frames,
        header::DataStoreHeader,
        helpers::{keccak256, serialize_g1_be},
    };
    use datalayr_prover::{
        group::KzgEncoderGroup,
        srs::{KzgConfig, SRS},
    };
    use datalayr_verifier::{validate::validate_frames, verify::KzgVerifierGroup};
    use lazy_static::lazy_static;
    use num_bigint::BigUint;
    use rand::Rng;

    const HEAD_BLOCK: u64 = 100;
    const TX_HASH: [u8; 32] = [7u8; 32];

    lazy_static! {
        static ref SRS_INSTANCE: Arc<SRS> =
            Arc::new(SRS::from_secret(Fr::from(0xd15e_u64), 2048).unwrap());
        static ref VERIFIERS: KzgVerifierGroup = KzgVerifierGroup::from_srs(SRS_INSTANCE.clone());
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[derive(Default)]
    struct MockChain {
        init_requests: Mutex<Vec<InitDataStoreRequest>>,
        confirmations: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl ChainClient for MockChain {
        async fn block_number(&self) -> Result<u64, DisperserError> {
            Ok(HEAD_BLOCK)
        }

        async fn quorum_threshold_bps(&self) -> Result<u32, DisperserError> {
            Ok(9000)
        }

        async fn adversary_threshold_bps(&self) -> Result<u32, DisperserError> {
            Ok(4000)
        }

        async fn precommit_fee(&self, duration: u8, total_size: u32) -> Result<BigUint, DisperserError> {
            Ok(BigUint::from(duration as u64 * total_size as u64))
        }

        async fn init_data_store(&self, request: InitDataStoreRequest) -> Result<[u8; 32], DisperserError> {
            self.init_requests.lock().unwrap().push(request);
            Ok(TX_HASH)
        }

        async fn confirm_data_store(
            &self,
            calldata: Vec<u8>,
            _event: &DataStoreInit,
        ) -> Result<(), DisperserError> {
            self.confirmations.lock().unwrap().push(calldata);
            Ok(())
        }
    }

    struct MockStateViews {
        state: StateView,
        emit_init_event: bool,
        requested_blocks: Mutex<Vec<u32>>,
    }

    fn init_event() -> DataStoreInit {
        let mut event = DataStoreInit {
            store_number: 5,
            data_commitment: [0xcc; 32],
            duration: 2,
            init_time: 1_700_000_000,
            index: 11,
            msg_hash: [0u8; 32],
        };
        event.msg_hash = get_message_hash(&event);
        event
    }

    #[async_trait]
    impl StateViewProvider for MockStateViews {
        async fn state_view(&self, block_number: u32) -> Result<StateView, DisperserError> {
            self.requested_blocks.lock().unwrap().push(block_number);
            Ok(self.state.clone())
        }

        async fn poll_init_data_store(
            &self,
            tx_hash: &[u8; 32],
            _timeout: Duration,
        ) -> Result<Option<DataStoreInit>, DisperserError> {
            assert_eq!(tx_hash, &TX_HASH);
            Ok(self.emit_init_event.then(init_event))
        }
    }

    /// Operators that sign whatever they are sent, except for the sockets in
    /// `down`.
    struct MockOperators {
        state: StateView,
        pairs: Vec<KeyPair>,
        down: HashSet<String>,
        received: Mutex<Vec<(String, Vec<Vec<u8>>)>>,
    }

    #[async_trait]
    impl OperatorClient for MockOperators {
        async fn store_frames(
            &self,
            socket: &str,
            msg_hash: [u8; 32],
            frames: Vec<Vec<u8>>,
        ) -> Result<Vec<u8>, TransportError> {
            if self.down.contains(socket) {
                return Err(TransportError {
                    socket: socket.to_string(),
                    reason: "unavailable".to_string(),
                });
            }
            self.received
                .lock()
                .unwrap()
                .push((socket.to_string(), frames));
            let index = self
                .state
                .registrants
                .iter()
                .position(|r| r.socket == socket)
                .unwrap();
            Ok(serialize_g1_be(&self.pairs[index].sign(&msg_hash)).to_vec())
        }
    }

    fn operator_set(n: usize) -> (StateView, Vec<KeyPair>) {
        let pairs: Vec<KeyPair> = (0..n)
            .map(|i| KeyPair::from_secret(Fr::from(77 + i as u64)).unwrap())
            .collect();
        let registrants: Vec<OperatorView> = pairs
            .iter()
            .enumerate()
            .map(|(i, pair)| OperatorView {
                address: [i as u8 + 1; 20],
                socket: format!("node-{i}:32001"),
                pubkey_g1: pair.pubkey_g1,
                pubkey_g2: pair.pubkey_g2,
                quorum_stakes: vec![BigUint::from(100u32)],
            })
            .collect();
        let state = StateView {
            total_operator: TotalOperatorView {
                index: 8,
                agg_pubkey_g1: aggregate_g1(&pairs.iter().map(|p| p.pubkey_g1).collect::<Vec<_>>()),
            },
            total_stake: TotalStakeView {
                index: 9,
                quorum_stakes: vec![BigUint::from(100u32 * n as u32)],
            },
            registrants,
        };
        (state, pairs)
    }

    type TestDisperser = Disperser<MockChain, MockStateViews, MockOperators>;

    fn setup(n: usize, down: &[usize], emit_init_event: bool) -> (TestDisperser, Arc<MockOperators>) {
        let (state, pairs) = operator_set(n);
        let operators = Arc::new(MockOperators {
            state: state.clone(),
            pairs,
            down: down.iter().map(|i| state.registrants[*i].socket.clone()).collect(),
            received: Mutex::new(Vec::new()),
        });
        let config = DisperserConfig {
            address: [0xaa; 20],
            ..Default::default()
        };
        let disperser = Disperser::new(
            config,
            KzgEncoderGroup::from_srs(KzgConfig::default(), SRS_INSTANCE.clone()),
            DataLayrChainClient::new(MockChain::default()),
            MockStateViews {
                state,
                emit_init_event,
                requested_blocks: Mutex::new(Vec::new()),
            },
            operators.clone(),
        );
        (disperser, operators)
    }

    fn random_data(len: usize) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen()).collect()
    }

    #[tokio::test]
    async fn test_disperse_end_to_end() {
        init_tracing();
        let (disperser, operators) = setup(4, &[], true);
        let req = disperser.store_request(0, 2, random_data(1000));
        let (store, sigs) = disperser.disperse(req).await.unwrap();

        let event = init_event();
        assert_eq!(store.metadata.reference_block_number, HEAD_BLOCK as u32);
        assert_eq!(store.metadata.store_id, event.store_number);
        assert_eq!(store.metadata.msg_hash, event.msg_hash);
        assert_eq!(store.metadata.fee, BigUint::from(2 * store.total_size as u64));
        assert_eq!(store.header.disperser, [0xaa; 20]);
        assert_eq!(
            DataStoreHeader::decode(&store.header_bytes).unwrap(),
            store.header
        );
        // four equal operators: two systematic and two parity chunks
        assert_eq!((store.header.num_sys, store.header.num_par), (2, 2));
        assert_eq!(store.frames.len(), 4);

        assert!(sigs.non_signer_pubkeys.is_empty());
        assert!(verify_signature(&sigs.agg_sig, &sigs.used_agg_pubkey_g2, &event.msg_hash));

        let init = disperser.chain.chain.init_requests.lock().unwrap();
        assert_eq!(init.len(), 1);
        assert_eq!(init[0].header, store.header_bytes);
        assert_eq!(init[0].total_operators_index, 8);

        let confirmations = disperser.chain.chain.confirmations.lock().unwrap();
        assert_eq!(confirmations.len(), 1);
        let calldata = &confirmations[0];
        assert_eq!(calldata.len(), 32 + 6 + 4 + 4 + 4 + 4 + 64 + 128 + 64);
        assert_eq!(&calldata[..32], &event.msg_hash);
        assert_eq!(&calldata[32..38], &[0, 0, 0, 0, 0, 9]);
        assert_eq!(&calldata[38..42], &(HEAD_BLOCK as u32).to_be_bytes());
        assert_eq!(&calldata[42..46], &5u32.to_be_bytes());
        assert_eq!(&calldata[46..50], &0u32.to_be_bytes());
        assert_eq!(&calldata[50..54], &8u32.to_be_bytes());

        // what every operator received passes node-side validation
        let received = operators.received.lock().unwrap();
        assert_eq!(received.len(), 4);
        for (socket, frames) in received.iter() {
            let (index, _) = disperser
                .state_views
                .state
                .registrants
                .iter()
                .enumerate()
                .find(|(_, r)| &r.socket == socket)
                .unwrap();
            let positions: Vec<u64> = store.assignments[index].indices().collect();
            let validated =
                validate_frames(&VERIFIERS, &store.header, 2, 2, frames, &positions).unwrap();
            assert_eq!(encode_frames(&validated), *frames);
        }
    }

    #[tokio::test]
    async fn test_offline_operator_is_listed_in_calldata() {
        let (disperser, _) = setup(4, &[2], true);
        let req = disperser.store_request(55, 1, random_data(600));
        let (store, sigs) = disperser.disperse(req).await.unwrap();

        assert_eq!(store.metadata.reference_block_number, 55);
        assert_eq!(
            sigs.non_signer_pubkeys,
            vec![disperser.state_views.state.registrants[2].pubkey_g1]
        );
        let confirmations = disperser.chain.chain.confirmations.lock().unwrap();
        let calldata = &confirmations[0];
        assert_eq!(calldata.len(), 310 + 68);
        assert_eq!(&calldata[46..50], &1u32.to_be_bytes());
        assert_eq!(&calldata[50..114], &serialize_g1_be(&sigs.non_signer_pubkeys[0]));
        assert_eq!(&calldata[114..118], &[0u8; 4]);
    }

    #[tokio::test]
    async fn test_calldata_orders_non_signers_by_hash() {
        let (disperser, _) = setup(6, &[0, 3, 5], true);
        let req = disperser.store_request(0, 1, random_data(600));
        let (_, sigs) = disperser.disperse(req).await.unwrap();
        assert_eq!(sigs.non_signer_pubkeys.len(), 3);

        let confirmations = disperser.chain.chain.confirmations.lock().unwrap();
        let calldata = &confirmations[0];
        assert_eq!(calldata.len(), 310 + 3 * 68);
        assert_eq!(&calldata[46..50], &3u32.to_be_bytes());

        let registrants = &disperser.state_views.state.registrants;
        let mut expected: Vec<[u8; 64]> = [0, 3, 5]
            .iter()
            .map(|i| serialize_g1_be(&registrants[*i].pubkey_g1))
            .collect();
        expected.sort_by_key(|bytes| keccak256(bytes));

        let mut previous = None;
        for (i, pubkey) in expected.iter().enumerate() {
            let block = &calldata[50 + 68 * i..50 + 68 * (i + 1)];
            assert_eq!(&block[..64], pubkey);
            assert_eq!(&block[64..], &[0u8; 4]);
            let hash = keccak256(&block[..64]);
            assert!(previous.map_or(true, |prev| prev < hash));
            previous = Some(hash);
        }
    }

    #[tokio::test]
    async fn test_precommit_timeout() {
        let (disperser, operators) = setup(3, &[], false);
        let req = disperser.store_request(0, 1, random_data(500));
        assert_eq!(
            disperser.disperse(req).await.unwrap_err(),
            DisperserError::PrecommitTimeout
        );
        assert!(operators.received.lock().unwrap().is_empty());
        assert!(disperser.chain.chain.confirmations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_store_rejections() {
        let (disperser, _) = setup(4, &[], true);
        let short = disperser.store_request(0, 1, random_data(31 * 4 - 1));
        assert_eq!(
            disperser.create_store(short).await.unwrap_err(),
            DisperserError::InvalidInputLength { len: 123, min: 124 }
        );

        let (mut empty, _) = setup(1, &[], true);
        empty.state_views.state.registrants.clear();
        let req = empty.store_request(0, 1, random_data(100));
        assert_eq!(
            empty.create_store(req).await.unwrap_err(),
            DisperserError::NotEnoughParticipants
        );
    }

    #[tokio::test]
    async fn test_repeated_payload_reuses_encoding() {
        let (disperser, _) = setup(4, &[], true);
        let data = random_data(800);
        let (first, _) = disperser
            .create_store(disperser.store_request(10, 1, data.clone()))
            .await
            .unwrap();
        let (second, _) = disperser
            .create_store(disperser.store_request(11, 1, data))
            .await
            .unwrap();
        assert_eq!(first.header, second.header);
        assert_eq!(first.frames, second.frames);
        assert_eq!(disperser.encoders.cached_encoders(), 1);
    }

    #[tokio::test]
    async fn test_encode_then_disperse_store() {
        let (disperser, operators) = setup(4, &[], true);
        let store = disperser.encode_store(42, 3, random_data(900)).await.unwrap();
        assert_eq!(disperser.coded_cache().len(), 1);
        assert_eq!(store.metadata.reference_block_number, 42);

        let header_hash = store.metadata.header_hash;
        let msg_hash = [0x5a; 32];
        let reply = disperser.disperse_store(&header_hash, msg_hash).await.unwrap();
        assert_eq!(reply.apk_index, 8);
        assert_eq!(reply.total_stake_index, 9);
        assert!(reply.sigs.non_signer_pubkeys.is_empty());
        assert!(verify_signature(&reply.sigs.agg_sig, &reply.sigs.used_agg_pubkey_g2, &msg_hash));
        assert!(disperser.coded_cache().is_empty());
        assert_eq!(operators.received.lock().unwrap().len(), 4);
        assert_eq!(
            *disperser.state_views.requested_blocks.lock().unwrap(),
            vec![42, 42]
        );

        assert_eq!(
            disperser.disperse_store(&header_hash, msg_hash).await.unwrap_err(),
            DisperserError::CacheError(CacheError::NotFound(hex::encode(header_hash)))
        );
    }
}
