use std::sync::Arc;
use std::time::Instant;

use ark_bn254::{Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use datalayr_primitives::{
    errors::KzgError,
    frame::Frame,
    helpers::{self, to_fr_array},
    params::EncodingParams,
    polynomial::GlobalPoly,
};
use tracing::{debug, error, trace};

use crate::{decoder::Decoder, encoder::Encoder, multiproof::Fk20Prover, srs::SRS};

/// Everything the disperser needs from one encoding: the commitment bundle,
/// one frame per chunk position and the leading coset index of each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedBlob {
    pub commitment: G1Affine,
    pub low_degree_proof: G1Affine,
    pub frames: Vec<Frame>,
    pub indices: Vec<u32>,
    pub poly: GlobalPoly,
}

/// Reed-Solomon encoder extended with KZG commitments, a low-degree proof and
/// FK20 multireveal proofs for one parameter set.
#[derive(Clone, Debug)]
pub struct KzgEncoder {
    pub encoder: Encoder,
    pub decoder: Decoder,
    pub srs: Arc<SRS>,
    fk20: Fk20Prover,
    verbose: bool,
}

impl KzgEncoder {
    pub fn new(params: EncodingParams, srs: Arc<SRS>, verbose: bool) -> Result<Self, KzgError> {
        check_srs_capacity(&params, &srs)?;
        let encoder = Encoder::new(params, verbose)?;
        let decoder = Decoder::new(params)?;
        let fk20 = Fk20Prover::new(&params, &srs)?;
        Ok(Self {
            encoder,
            decoder,
            srs,
            fk20,
            verbose,
        })
    }

    pub fn params(&self) -> &EncodingParams {
        &self.encoder.params
    }

    pub fn encode_bytes(&self, data: &[u8]) -> Result<EncodedBlob, KzgError> {
        self.encode(&to_fr_array(data))
    }

    pub fn encode(&self, input_fr: &[Fr]) -> Result<EncodedBlob, KzgError> {
        let start = Instant::now();
        let encoded = self.encoder.encode(input_fr)?;
        let rs_elapsed = start.elapsed();

        let coeffs = encoded.poly.coeffs();
        let commitment = self.commit(coeffs)?;
        let low_degree_proof = self.low_degree_proof(coeffs)?;

        if !verify_low_degree_proof(
            &commitment,
            &low_degree_proof,
            self.params().global_poly_degree,
            &self.srs,
        ) {
            error!("freshly computed low degree proof does not verify");
            return Err(KzgError::LowDegreeProofFailed);
        }

        let proofs = self.fk20.compute_proofs(coeffs)?;
        let frames = encoded
            .chunks
            .into_iter()
            .zip(&encoded.indices)
            .map(|(chunk, &index)| {
                proofs
                    .get(index as usize)
                    .map(|proof| Frame::new(*proof, chunk))
                    .ok_or(KzgError::MultiRevealProofFailed {
                        index: index as u64,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if self.verbose {
            debug!(
                rs_ms = rs_elapsed.as_millis() as u64,
                total_ms = start.elapsed().as_millis() as u64,
                frames = frames.len(),
                "kzg encoding done"
            );
        }

        Ok(EncodedBlob {
            commitment,
            low_degree_proof,
            frames,
            indices: encoded.indices,
            poly: encoded.poly,
        })
    }

    /// `[p(τ)]` for a polynomial in coefficient form.
    pub fn commit(&self, coeffs: &[Fr]) -> Result<G1Affine, KzgError> {
        commit_coeff_form(coeffs, &self.srs)
    }

    /// `[τ^{SRSOrder - m} · p(τ)]`: only exists if `deg p < m`.
    pub fn low_degree_proof(&self, coeffs: &[Fr]) -> Result<G1Affine, KzgError> {
        let m = self.params().padded_sys_group_size as usize;
        if coeffs.len() > m {
            return Err(KzgError::SerializationError(
                "polynomial length is not correct".to_string(),
            ));
        }
        let order = self.srs.order as usize;
        let shifted = &self.srs.g1[order - m..order - m + coeffs.len()];
        trace!(shift = order - m, "low degree proof");
        helpers::g1_lincomb(shifted, coeffs)
    }
}

pub fn commit_coeff_form(coeffs: &[Fr], srs: &SRS) -> Result<G1Affine, KzgError> {
    if coeffs.len() > srs.g1.len() {
        return Err(KzgError::SerializationError(
            "polynomial length is not correct".to_string(),
        ));
    }
    if coeffs.is_empty() {
        return Ok(G1Affine::zero());
    }
    helpers::g1_lincomb(&srs.g1[..coeffs.len()], coeffs)
}

/// Checks `e(C, [τ^{SRSOrder-1-degree}]_2) == e(proof, G2)`.
pub fn verify_low_degree_proof(
    commitment: &G1Affine,
    proof: &G1Affine,
    claimed_degree: u64,
    srs: &SRS,
) -> bool {
    let order = srs.order as u64;
    if claimed_degree >= order {
        return false;
    }
    match srs.g2.get((order - 1 - claimed_degree) as usize) {
        Some(shift) => {
            helpers::pairings_verify(*commitment, *shift, *proof, G2Affine::generator())
        },
        None => false,
    }
}

/// The SRS must cover the global polynomial, the low-degree shift and the
/// `[τ^l]_2` used by frame verification.
pub fn check_srs_capacity(params: &EncodingParams, srs: &SRS) -> Result<(), KzgError> {
    let m = params.padded_sys_group_size as usize;
    let order = srs.order as usize;
    if m > order || srs.g1.len() < order {
        return Err(KzgError::SrsCapacityExceeded {
            polynomial_len: m,
            srs_len: srs.g1.len().min(order),
        });
    }
    let needed_g2 = (params.chunk_len as usize + 1).max(order - m + 1);
    if srs.g2.len() < needed_g2 {
        return Err(KzgError::SrsCapacityExceeded {
            polynomial_len: needed_g2,
            srs_len: srs.g2.len(),
        });
    }
    Ok(())
}
