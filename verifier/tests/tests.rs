#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ark_bn254::{Fr, G1Affine, G1Projective};
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_ff::UniformRand;
    use datalayr_primitives::{
        errors::{HeaderError, KzgError},
        frame::encode_frames,
        header::DataStoreHeader,
    };
    use datalayr_prover::{
        group::KzgEncoderGroup,
        kzg::EncodedBlob,
        srs::{KzgConfig, SRS},
    };
    use datalayr_verifier::{
        validate::{validate_frames, ValidationError},
        verify::KzgVerifierGroup,
    };
    use lazy_static::lazy_static;
    use rand::Rng;

    lazy_static! {
        static ref SRS_INSTANCE: Arc<SRS> =
            Arc::new(SRS::from_secret(Fr::from(0xdead_beef_u64), 2048).unwrap());
        static ref ENCODERS: KzgEncoderGroup =
            KzgEncoderGroup::from_srs(KzgConfig::default(), SRS_INSTANCE.clone());
        static ref VERIFIERS: KzgVerifierGroup = KzgVerifierGroup::from_srs(SRS_INSTANCE.clone());
    }

    fn encode(num_sys: u64, num_par: u64, len: usize) -> (Vec<u8>, EncodedBlob) {
        let mut rng = rand::thread_rng();
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let encoder = ENCODERS.get_kzg_encoder(num_sys, num_par, len as u64).unwrap();
        let encoded = encoder.encode_bytes(&data).unwrap();
        (data, encoded)
    }

    fn header_for(num_sys: u64, num_par: u64, len: usize, encoded: &EncodedBlob) -> DataStoreHeader {
        DataStoreHeader {
            kzg_commit: encoded.commitment,
            degree: encoded.frames[0].len() as u32,
            num_sys: num_sys as u32,
            num_par: num_par as u32,
            orig_data_size: len as u32,
            disperser: [7u8; 20],
            low_degree_proof: encoded.low_degree_proof,
        }
    }

    #[test]
    fn test_verify_commit() {
        let (_, encoded) = encode(4, 4, 1000);
        let verifier = VERIFIERS.get_kzg_verifier(4, 4, 1000).unwrap();
        verifier
            .verify_commit(&encoded.commitment, &encoded.low_degree_proof)
            .unwrap();

        // a proof for a different polynomial does not verify
        let (_, other) = encode(4, 4, 1000);
        assert_eq!(
            verifier.verify_commit(&encoded.commitment, &other.low_degree_proof),
            Err(KzgError::LowDegreeProofFailed)
        );

        // a commitment to a polynomial of too high a degree has no valid proof
        let bumped = (encoded.commitment.into_group()
            + SRS_INSTANCE.g1[verifier.params.padded_sys_group_size as usize])
            .into_affine();
        assert_eq!(
            verifier.verify_commit(&bumped, &encoded.low_degree_proof),
            Err(KzgError::LowDegreeProofFailed)
        );
    }

    #[test]
    fn test_verify_every_frame() {
        for (num_sys, num_par, len) in [(4, 4, 1000), (3, 5, 2500), (5, 11, 400), (1, 1, 31)] {
            let (_, encoded) = encode(num_sys, num_par, len);
            let verifier = VERIFIERS.get_kzg_verifier(num_sys, num_par, len as u64).unwrap();
            for (position, frame) in encoded.frames.iter().enumerate() {
                verifier
                    .verify_frame(&encoded.commitment, frame, position as u64)
                    .unwrap();
            }
        }
    }

    #[test]
    fn test_verify_frame_rejects_tampering() {
        let (_, encoded) = encode(4, 4, 1000);
        let verifier = VERIFIERS.get_kzg_verifier(4, 4, 1000).unwrap();

        let mut frame = encoded.frames[2].clone();
        frame.coeffs[3] += Fr::from(1u64);
        assert_eq!(
            verifier.verify_frame(&encoded.commitment, &frame, 2),
            Err(KzgError::MultiRevealProofFailed { index: 2 })
        );

        // a valid frame claimed at the wrong position
        assert_eq!(
            verifier.verify_frame(&encoded.commitment, &encoded.frames[2], 3),
            Err(KzgError::MultiRevealProofFailed { index: 3 })
        );

        let mut frame = encoded.frames[5].clone();
        frame.proof = (G1Projective::from(frame.proof) * Fr::rand(&mut rand::thread_rng())).into_affine();
        assert_eq!(
            verifier.verify_frame(&encoded.commitment, &frame, 5),
            Err(KzgError::MultiRevealProofFailed { index: 5 })
        );

        let mut short = encoded.frames[0].clone();
        short.coeffs.pop();
        assert_eq!(
            verifier.verify_frame(&encoded.commitment, &short, 0),
            Err(KzgError::InvalidInputLength)
        );

        assert!(matches!(
            verifier.verify_frame(&encoded.commitment, &encoded.frames[0], 8),
            Err(KzgError::EncodingError(_))
        ));
    }

    #[test]
    fn test_verifier_group_caches_per_params() {
        let group = KzgVerifierGroup::from_srs(SRS_INSTANCE.clone());
        let a = group.get_kzg_verifier(4, 4, 1000).unwrap();
        let b = group.get_kzg_verifier(4, 4, 1000).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let _ = group.get_kzg_verifier(4, 5, 1000).unwrap();
        assert_eq!(group.cached_verifiers(), 2);

        let fresh = group.new_kzg_verifier(4, 4, 1000).unwrap();
        assert_eq!(fresh.params, a.params);
        assert_eq!(group.cached_verifiers(), 2);
    }

    #[test]
    fn test_validate_frames_accepts_honest_frames() {
        let (_, encoded) = encode(4, 4, 1000);
        let header = header_for(4, 4, 1000, &encoded);

        let positions = vec![1u64, 6];
        let bytes: Vec<Vec<u8>> = positions
            .iter()
            .map(|&p| encoded.frames[p as usize].encode())
            .collect();
        let frames = validate_frames(&VERIFIERS, &header, 4, 4, &bytes, &positions).unwrap();
        assert_eq!(frames[0], encoded.frames[1]);
        assert_eq!(frames[1], encoded.frames[6]);

        let batch = encode_frames(&encoded.frames);
        assert!(!batch.is_empty());
    }

    #[test]
    fn test_validate_frames_rejections() {
        let (_, encoded) = encode(4, 4, 1000);
        let header = header_for(4, 4, 1000, &encoded);
        let bytes = vec![encoded.frames[0].encode(), encoded.frames[1].encode()];

        assert_eq!(
            validate_frames(&VERIFIERS, &header, 4, 4, &bytes, &[0]),
            Err(ValidationError::LengthMismatch {
                frames: 2,
                positions: 1
            })
        );
        assert_eq!(
            validate_frames::<Vec<u8>>(&VERIFIERS, &header, 4, 4, &[], &[]),
            Err(ValidationError::NoFrames)
        );
        assert_eq!(
            validate_frames(&VERIFIERS, &header, 5, 4, &bytes, &[0, 1]),
            Err(ValidationError::HeaderError(HeaderError::InconsistentNumSys {
                header: 4,
                expected: 5
            }))
        );

        let mut bad_header = header.clone();
        bad_header.low_degree_proof = G1Affine::generator();
        assert_eq!(
            validate_frames(&VERIFIERS, &bad_header, 4, 4, &bytes, &[0, 1]),
            Err(ValidationError::KzgError(KzgError::LowDegreeProofFailed))
        );

        assert_eq!(
            validate_frames(&VERIFIERS, &header, 4, 4, &bytes, &[1, 0]),
            Err(ValidationError::KzgError(KzgError::MultiRevealProofFailed {
                index: 1
            }))
        );

        let mut truncated = encoded.frames[0].clone();
        truncated.coeffs.pop();
        let mixed = vec![encoded.frames[0].encode(), truncated.encode()];
        assert_eq!(
            validate_frames(&VERIFIERS, &header, 4, 4, &mixed, &[0, 1]),
            Err(ValidationError::InconsistentFrameLengths {
                position: 1,
                expected: encoded.frames[0].len(),
                got: encoded.frames[0].len() - 1
            })
        );

        assert!(matches!(
            validate_frames(&VERIFIERS, &header, 4, 4, &[vec![0u8; 10]], &[0]),
            Err(ValidationError::FrameError(_))
        ));
    }
}
