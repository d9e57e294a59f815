use ark_bn254::{Fr, G1Affine, G1Projective, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::Field;
use datalayr_primitives::{
    errors::KzgError,
    helpers::{eval_poly_at, hash_to_field_element, pairings_verify, serialize_g1_be},
    polynomial::{divide_by_linear, poly_long_div, vanishing_poly},
    rb::reverse_bits_limited,
};
use tracing::trace;

use crate::kzg::{commit_coeff_form, EncodedBlob, KzgEncoder};

/// Proof that the global polynomial vanishes on the cosets of the
/// zero-padded systematic slots `numSys..numSysE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZeroPaddingProof {
    pub proof: G1Affine,
    pub quotient_commit: G1Affine,
}

impl KzgEncoder {
    /// `Π (x^l - h_s^l)` over the padding slots.
    fn padding_vanishing_poly(&self) -> Vec<Fr> {
        let params = self.params();
        let l = params.chunk_len;
        let root_pows: Vec<Fr> = (params.num_sys..params.num_sys_e)
            .map(|slot| {
                let coset = reverse_bits_limited(params.num_node_e as u32, slot as u32);
                self.encoder.fs.coset_leader(coset as u64).pow([l])
            })
            .collect();
        vanishing_poly(l as usize, &root_pows)
    }

    /// Commits to `q = p / V`, then opens `p - V(α)·q` at a Fiat-Shamir
    /// point `α`, where that polynomial has a root.
    pub fn prove_zero_padding(
        &self,
        coeffs: &[Fr],
        commit: &G1Affine,
    ) -> Result<ZeroPaddingProof, KzgError> {
        let vanishing = self.padding_vanishing_poly();
        let quotient = poly_long_div(coeffs, &vanishing)?;
        let quotient_commit = commit_coeff_form(&quotient, &self.srs)?;

        let alpha = padding_challenge(&quotient_commit, commit);
        let vanishing_eval = eval_poly_at(&vanishing, &alpha);

        let mut numerator = coeffs.to_vec();
        for (n, q) in numerator.iter_mut().zip(&quotient) {
            *n -= vanishing_eval * q;
        }
        let proof = commit_coeff_form(&divide_by_linear(&numerator, &alpha), &self.srs)?;
        trace!(
            padding_slots = self.params().num_sys_e - self.params().num_sys,
            "zero padding proof"
        );

        Ok(ZeroPaddingProof {
            proof,
            quotient_commit,
        })
    }

    /// Checks `e(α·π + C - V(α)·Q, G2) == e(π, [τ]_2)`.
    pub fn verify_zero_padding(
        &self,
        proof: &ZeroPaddingProof,
        commit: &G1Affine,
    ) -> Result<(), KzgError> {
        let tau_g2 = self
            .srs
            .g2
            .get(1)
            .copied()
            .ok_or(KzgError::SrsCapacityExceeded {
                polynomial_len: 2,
                srs_len: self.srs.g2.len(),
            })?;

        let alpha = padding_challenge(&proof.quotient_commit, commit);
        let vanishing_eval = eval_poly_at(&self.padding_vanishing_poly(), &alpha);

        let lhs: G1Projective =
            proof.proof * alpha + commit.into_group() - proof.quotient_commit * vanishing_eval;

        if pairings_verify(lhs.into_affine(), G2Affine::generator(), proof.proof, tau_g2) {
            Ok(())
        } else {
            Err(KzgError::ZeroPaddingProofFailed)
        }
    }

    /// Encodes like [KzgEncoder::encode] and attaches a zero-padding proof.
    pub fn encode_with_padding_proof(
        &self,
        input_fr: &[Fr],
    ) -> Result<(EncodedBlob, ZeroPaddingProof), KzgError> {
        let encoded = self.encode(input_fr)?;
        let proof = self.prove_zero_padding(encoded.poly.coeffs(), &encoded.commitment)?;
        Ok((encoded, proof))
    }
}

fn padding_challenge(quotient_commit: &G1Affine, commit: &G1Affine) -> Fr {
    let mut transcript = Vec::with_capacity(128);
    transcript.extend_from_slice(&serialize_g1_be(quotient_commit));
    transcript.extend_from_slice(&serialize_g1_be(commit));
    hash_to_field_element(&transcript)
}
