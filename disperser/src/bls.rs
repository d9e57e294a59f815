//! BLS signatures over bn254 with signatures in G1 and public keys in both
//! groups. Operators register their key in G1 and G2; signatures are checked
//! against the G2 key, aggregate keys are cross-checked between the groups.

use ark_bn254::{Fq, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, One, PrimeField, UniformRand, Zero};
use ark_std::rand::Rng;
use datalayr_primitives::helpers::{
    deserialize_g1_be, deserialize_g2_be, keccak256, lexicographically_largest, pairings_verify,
};

use crate::errors::BlsError;

/// Maps a message onto G1 by try-and-increment on `x = keccak(msg) mod p`.
pub fn hash_to_g1(msg: &[u8]) -> G1Affine {
    let mut x = Fq::from_be_bytes_mod_order(&keccak256(msg));
    loop {
        let rhs = x * x * x + Fq::from(3u64);
        if let Some(y) = rhs.sqrt() {
            let y = if lexicographically_largest(&y) { -y } else { y };
            // bn254 G1 has cofactor one
            return G1Affine::new_unchecked(x, y);
        }
        x += Fq::one();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair {
    secret: Fr,
    pub pubkey_g1: G1Affine,
    pub pubkey_g2: G2Affine,
}

impl KeyPair {
    pub fn from_secret(secret: Fr) -> Result<Self, BlsError> {
        if secret.is_zero() {
            return Err(BlsError::ZeroSecretKey);
        }
        Ok(Self {
            secret,
            pubkey_g1: (G1Affine::generator() * secret).into_affine(),
            pubkey_g2: (G2Affine::generator() * secret).into_affine(),
        })
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        loop {
            if let Ok(pair) = Self::from_secret(Fr::rand(rng)) {
                return pair;
            }
        }
    }

    pub fn sign(&self, msg: &[u8]) -> G1Affine {
        (hash_to_g1(msg) * self.secret).into_affine()
    }
}

/// `e(H(m), pk) == e(σ, G2)`.
pub fn verify_signature(sig: &G1Affine, pubkey_g2: &G2Affine, msg: &[u8]) -> bool {
    pairings_verify(hash_to_g1(msg), *pubkey_g2, *sig, G2Affine::generator())
}

/// Whether `g1` and `g2` share one discrete log: `e(g1, G2) == e(G1, g2)`.
pub fn check_g1_g2_dleq(g1: &G1Affine, g2: &G2Affine) -> bool {
    pairings_verify(*g1, G2Affine::generator(), G1Affine::generator(), *g2)
}

pub fn aggregate_g1(points: &[G1Affine]) -> G1Affine {
    points
        .iter()
        .fold(G1Projective::zero(), |acc, p| acc + p)
        .into_affine()
}

pub fn aggregate_g2(points: &[G2Affine]) -> G2Affine {
    points
        .iter()
        .fold(G2Projective::zero(), |acc, p| acc + p)
        .into_affine()
}

/// Parses a 64-byte `X || Y` signature.
pub fn signature_from_bytes(bytes: &[u8]) -> Result<G1Affine, BlsError> {
    deserialize_g1_be(bytes).map_err(|e| BlsError::InvalidSignature(e.to_string()))
}

/// Parses a 128-byte G2 public key.
pub fn pubkey_g2_from_bytes(bytes: &[u8]) -> Result<G2Affine, BlsError> {
    deserialize_g2_be(bytes).map_err(|e| BlsError::InvalidPublicKey(e.to_string()))
}
