//! FK20 multireveal proofs.
//!
//! For a polynomial `f` of degree `< m` and chunks of length `l`, write
//! `f(x) = Σ_t x^{lt} F_t(x)` with `T = m / l` blocks. Dividing by the coset
//! vanishing polynomial `x^l - c` gives the quotient commitment
//!
//! `π(c) = Σ_u c^u h_u`, `h_u = Σ_{t>u} [τ^{l(t-1-u)} F_t(τ)]`.
//!
//! Every coset `e` of the node domain has `c = ω_E^e`, so all proofs are one
//! FFT of the vector `h` over the `E = numNodeE` domain. Each `h_u` splits
//! into `l` Toeplitz products (one per residue `r` of the coefficient index)
//! which are evaluated as circulant convolutions of size `2E`; the SRS side
//! of those convolutions is fixed per parameter set and precomputed.

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{CurveGroup, VariableBaseMSM};
use ark_std::Zero;
use datalayr_primitives::{errors::KzgError, fft::FFTSettings, params::EncodingParams};
use rayon::prelude::*;
use tracing::debug;

use crate::srs::SRS;

/// Precomputed SRS tables for one parameter set.
#[derive(Clone, Debug)]
pub struct Fk20Prover {
    chunk_len: usize,
    num_blocks: usize,
    num_node_e: usize,
    /// Size of the circulant domain, `2·numNodeE`.
    circulant_len: usize,
    circulant_fs: FFTSettings,
    node_fs: FFTSettings,
    /// `table[k][r]`: entry `k` of the FFT of the SRS column for residue `r`.
    table: Vec<Vec<G1Affine>>,
}

impl Fk20Prover {
    pub fn new(params: &EncodingParams, srs: &SRS) -> Result<Self, KzgError> {
        let l = params.chunk_len as usize;
        let m = params.padded_sys_group_size as usize;
        let num_node_e = params.num_node_e as usize;
        let num_blocks = m / l;
        let circulant_len = 2 * num_node_e;

        if srs.g1.len() < m {
            return Err(KzgError::SrsCapacityExceeded {
                polynomial_len: m,
                srs_len: srs.g1.len(),
            });
        }

        let circulant_fs = FFTSettings::new(circulant_len)?;
        let node_fs = FFTSettings::new(num_node_e)?;

        // column r: [τ^{lk + r}] for k < T - 1, zero above
        let columns = (0..l)
            .into_par_iter()
            .map(|r| {
                let mut column = vec![G1Projective::zero(); circulant_len];
                for (k, slot) in column.iter_mut().enumerate().take(num_blocks.saturating_sub(1)) {
                    *slot = srs.g1[l * k + r].into();
                }
                circulant_fs.fft_g1(&column, false)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let table = (0..circulant_len)
            .into_par_iter()
            .map(|k| {
                let row: Vec<G1Projective> = columns.iter().map(|column| column[k]).collect();
                G1Projective::normalize_batch(&row)
            })
            .collect();

        debug!(chunk_len = l, num_node_e, circulant_len, "precomputed fk20 tables");

        Ok(Self {
            chunk_len: l,
            num_blocks,
            num_node_e,
            circulant_len,
            circulant_fs,
            node_fs,
            table,
        })
    }

    /// Proofs for every coset of the node domain, indexed by leading coset
    /// index.
    pub fn compute_proofs(&self, coeffs: &[Fr]) -> Result<Vec<G1Affine>, KzgError> {
        let l = self.chunk_len;
        let k_len = self.circulant_len;
        if coeffs.len() > l * self.num_blocks {
            return Err(KzgError::SrsCapacityExceeded {
                polynomial_len: coeffs.len(),
                srs_len: l * self.num_blocks,
            });
        }
        let coeff = |i: usize| coeffs.get(i).copied().unwrap_or_else(Fr::zero);

        // polynomial side: b_r[K - t] = f_{lt + r} for 1 <= t < T
        let columns = (0..l)
            .into_par_iter()
            .map(|r| {
                let mut column = vec![Fr::zero(); k_len];
                for t in 1..self.num_blocks {
                    column[k_len - t] = coeff(l * t + r);
                }
                self.circulant_fs.fft_fr(&column, false)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let products = (0..k_len)
            .into_par_iter()
            .map(|k| {
                let scalars: Vec<Fr> = columns.iter().map(|column| column[k]).collect();
                G1Projective::msm(&self.table[k], &scalars)
                    .map_err(|e| KzgError::MsmError(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let convolved = self.circulant_fs.fft_g1(&products, true)?;
        let h: Vec<G1Projective> = (0..self.num_node_e)
            .map(|u| convolved[k_len - 1 - u])
            .collect();
        let proofs = self.node_fs.fft_g1(&h, false)?;
        Ok(G1Projective::normalize_batch(&proofs))
    }
}
