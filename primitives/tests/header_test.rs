use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{CurveGroup, PrimeGroup};
use ark_ff::UniformRand;
use datalayr_primitives::{
    consts::DATA_STORE_HEADER_SIZE,
    errors::HeaderError,
    header::DataStoreHeader,
    helpers::{keccak256, serialize_g1_be},
    params::EncodingParams,
};

fn sample_header() -> DataStoreHeader {
    let mut rng = rand::thread_rng();
    let params = EncodingParams::new(4, 4, 1000).unwrap();
    DataStoreHeader {
        kzg_commit: (G1Projective::generator() * Fr::rand(&mut rng)).into_affine(),
        degree: params.chunk_len as u32,
        num_sys: 4,
        num_par: 4,
        orig_data_size: 1000,
        disperser: [0x11; 20],
        low_degree_proof: (G1Projective::generator() * Fr::rand(&mut rng)).into_affine(),
    }
}

#[test]
fn test_header_layout() {
    let header = sample_header();
    let bytes = header.encode();
    assert_eq!(bytes.len(), DATA_STORE_HEADER_SIZE);
    assert_eq!(&bytes[..64], &serialize_g1_be(&header.kzg_commit));
    assert_eq!(&bytes[64..68], &16u32.to_be_bytes());
    assert_eq!(&bytes[68..72], &4u32.to_be_bytes());
    assert_eq!(&bytes[72..76], &4u32.to_be_bytes());
    assert_eq!(&bytes[76..80], &1000u32.to_be_bytes());
    assert_eq!(&bytes[80..100], &[0x11; 20]);
    assert_eq!(&bytes[100..], &serialize_g1_be(&header.low_degree_proof));
}

#[test]
fn test_header_decode_inverts_encode() {
    let header = sample_header();
    assert_eq!(DataStoreHeader::decode(&header.encode()).unwrap(), header);

    let mut zero = header.clone();
    zero.kzg_commit = G1Affine::identity();
    assert_eq!(DataStoreHeader::decode(&zero.encode()).unwrap(), zero);
}

#[test]
fn test_header_decode_rejects_wrong_length() {
    let bytes = sample_header().encode();
    assert_eq!(
        DataStoreHeader::decode(&bytes[..163]),
        Err(HeaderError::InvalidLength {
            expected: 164,
            got: 163
        })
    );
}

#[test]
fn test_header_hash_is_keccak_of_encoding() {
    let header = sample_header();
    assert_eq!(header.header_hash(), keccak256(&header.encode()));
    let mut other = header.clone();
    other.orig_data_size += 1;
    assert_ne!(header.header_hash(), other.header_hash());
}

#[test]
fn test_header_validate() {
    let header = sample_header();
    assert_eq!(header.validate(4, 4, 16), Ok(()));
    assert_eq!(
        header.validate(5, 4, 16),
        Err(HeaderError::InconsistentNumSys {
            header: 4,
            expected: 5
        })
    );
    assert_eq!(
        header.validate(4, 3, 16),
        Err(HeaderError::InconsistentNumPar {
            header: 4,
            expected: 3
        })
    );
    assert_eq!(
        header.validate(4, 4, 8),
        Err(HeaderError::InconsistentFrameLength {
            degree: 16,
            frame_len: 8
        })
    );

    let mut wrong_degree = header.clone();
    wrong_degree.degree = 8;
    assert_eq!(
        wrong_degree.validate(4, 4, 8),
        Err(HeaderError::InconsistentDegreeAndOrigDataSize {
            degree: 8,
            expected: 16
        })
    );
}
