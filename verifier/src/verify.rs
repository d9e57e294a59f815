use std::sync::Arc;

use ark_bn254::{Fr, G1Affine, G2Affine, G2Projective};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::Field;
use datalayr_primitives::{
    errors::KzgError, fft::FFTSettings, frame::Frame, helpers, params::EncodingParams,
};
use datalayr_prover::{
    group::ParamsCache,
    kzg::{check_srs_capacity, commit_coeff_form, verify_low_degree_proof},
    srs::{KzgConfig, SRS},
};

/// Core multireveal pairing check.
///
/// Given a commitment `C`, the commitment `I` to the polynomial interpolating
/// the revealed points, a quotient proof `π` and the G2 commitment `Z` to the
/// vanishing polynomial of those points, checks
/// `e(C - I, G2) == e(π, Z)`, i.e. that `C - I` is divisible by `Z`.
pub fn verify_multireveal_impl(
    commitment: &G1Affine,
    interpolation_commit: &G1Affine,
    proof: &G1Affine,
    zero_poly_commit: &G2Affine,
) -> bool {
    let commit_minus_interpolation = (*commitment - *interpolation_commit).into_affine();
    helpers::pairings_verify(
        commit_minus_interpolation,
        G2Affine::generator(),
        *proof,
        *zero_poly_commit,
    )
}

/// `[τ^l]_2 - [c]_2`, the commitment to `x^l - c`.
pub fn coset_zero_poly_commit(tau_l_g2: &G2Affine, c: &Fr) -> G2Affine {
    (tau_l_g2.into_group() - G2Projective::from(G2Affine::generator()) * c).into_affine()
}

/// Verifies the commitment bundle and the frames of one parameter set.
#[derive(Clone, Debug)]
pub struct KzgVerifier {
    pub params: EncodingParams,
    pub fs: FFTSettings,
    pub srs: Arc<SRS>,
}

impl KzgVerifier {
    pub fn new(params: EncodingParams, srs: Arc<SRS>) -> Result<Self, KzgError> {
        check_srs_capacity(&params, &srs)?;
        let fs = FFTSettings::new(params.padded_node_group_size as usize)?;
        Ok(Self { params, fs, srs })
    }

    /// Checks the low-degree proof against `globalPolyDegree`.
    pub fn verify_commit(&self, commit: &G1Affine, proof: &G1Affine) -> Result<(), KzgError> {
        if verify_low_degree_proof(commit, proof, self.params.global_poly_degree, &self.srs) {
            Ok(())
        } else {
            Err(KzgError::LowDegreeProofFailed)
        }
    }

    /// Checks the opening proof of the frame stored at linear `position`.
    pub fn verify_frame(
        &self,
        commit: &G1Affine,
        frame: &Frame,
        position: u64,
    ) -> Result<(), KzgError> {
        let l = self.params.chunk_len;
        if frame.len() as u64 != l {
            return Err(KzgError::InvalidInputLength);
        }
        let coset = self.params.leading_coset_index(position)?;

        let tau_l_g2 = self
            .srs
            .g2
            .get(l as usize)
            .ok_or(KzgError::SrsCapacityExceeded {
                polynomial_len: l as usize + 1,
                srs_len: self.srs.g2.len(),
            })?;
        let c = self.fs.coset_leader(coset as u64).pow([l]);
        let zero_poly_commit = coset_zero_poly_commit(tau_l_g2, &c);
        let interpolation_commit = commit_coeff_form(&frame.coeffs, &self.srs)?;

        if verify_multireveal_impl(commit, &interpolation_commit, &frame.proof, &zero_poly_commit) {
            Ok(())
        } else {
            Err(KzgError::MultiRevealProofFailed { index: position })
        }
    }

    /// Verifies every frame; the first failing position is reported.
    pub fn verify_frames(
        &self,
        commit: &G1Affine,
        frames: &[Frame],
        positions: &[u64],
    ) -> Result<(), KzgError> {
        if frames.len() != positions.len() {
            return Err(KzgError::InvalidInputLength);
        }
        frames
            .iter()
            .zip(positions)
            .try_for_each(|(frame, &position)| self.verify_frame(commit, frame, position))
    }
}

/// Shares one SRS across the verifiers of every parameter set seen so far.
#[derive(Debug)]
pub struct KzgVerifierGroup {
    pub srs: Arc<SRS>,
    verifiers: ParamsCache<KzgVerifier>,
}

impl KzgVerifierGroup {
    pub fn new(config: &KzgConfig) -> Result<Self, KzgError> {
        Ok(Self::from_srs(Arc::new(SRS::new(config)?)))
    }

    pub fn from_srs(srs: Arc<SRS>) -> Self {
        Self {
            srs,
            verifiers: ParamsCache::new(),
        }
    }

    pub fn get_kzg_verifier(
        &self,
        num_sys: u64,
        num_par: u64,
        data_byte_len: u64,
    ) -> Result<Arc<KzgVerifier>, KzgError> {
        let params = EncodingParams::new(num_sys, num_par, data_byte_len)?;
        self.verifiers
            .get_or_try_insert_with(params, |params| KzgVerifier::new(*params, self.srs.clone()))
    }

    pub fn new_kzg_verifier(
        &self,
        num_sys: u64,
        num_par: u64,
        data_byte_len: u64,
    ) -> Result<KzgVerifier, KzgError> {
        let params = EncodingParams::new(num_sys, num_par, data_byte_len)?;
        KzgVerifier::new(params, self.srs.clone())
    }

    pub fn cached_verifiers(&self) -> usize {
        self.verifiers.len()
    }
}
