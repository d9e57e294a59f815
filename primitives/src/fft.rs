use ark_bn254::{Fr, G1Projective};
use ark_ff::Field;
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use ark_std::{vec::Vec, One};

extern crate alloc;
use alloc::format;

use crate::{consts::MAX_LOG_FFT_SIZE, errors::PolynomialError};

/// Root-of-unity bookkeeping for one power-of-two evaluation domain of size
/// `max_width`, plus FFTs over any power-of-two sub-domain of it.
///
/// Roots are the arkworks two-adic roots, so the `m`-th root returned for a
/// sub-domain of size `m` is always `ω^{max_width / m}`.
#[derive(Clone, Debug)]
pub struct FFTSettings {
    max_width: usize,
    root_of_unity: Fr,
}

impl FFTSettings {
    pub fn new(max_width: usize) -> Result<Self, PolynomialError> {
        if max_width == 0 || !max_width.is_power_of_two() {
            return Err(PolynomialError::FFTError(format!(
                "fft width must be a power of two, got {}",
                max_width
            )));
        }
        if max_width > 1 << MAX_LOG_FFT_SIZE {
            return Err(PolynomialError::DomainTooLarge {
                size: max_width,
                max_width: 1 << MAX_LOG_FFT_SIZE,
            });
        }
        let root_of_unity = domain(max_width)?.group_gen();
        Ok(Self {
            max_width,
            root_of_unity,
        })
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Primitive `max_width`-th root of unity.
    pub fn root_of_unity(&self) -> Fr {
        self.root_of_unity
    }

    /// `ω^index`, the leading element of coset `index`.
    pub fn coset_leader(&self, index: u64) -> Fr {
        self.root_of_unity.pow([index])
    }

    /// `[ω^0, ω^1, .., ω^{max_width}]`; the last entry wraps back to one.
    pub fn expanded_roots_of_unity(&self) -> Vec<Fr> {
        let mut roots = Vec::with_capacity(self.max_width + 1);
        let mut current = Fr::one();
        for _ in 0..=self.max_width {
            roots.push(current);
            current *= self.root_of_unity;
        }
        roots
    }

    fn check_width(&self, len: usize) -> Result<(), PolynomialError> {
        if len == 0 || !len.is_power_of_two() || len > self.max_width {
            return Err(PolynomialError::FFTError(format!(
                "got {} values but fft width is a power of two up to {}",
                len, self.max_width
            )));
        }
        Ok(())
    }

    /// Forward (coefficients to evaluations) or inverse FFT over the domain of
    /// size `vals.len()`. Evaluations are in natural order.
    pub fn fft_fr(&self, vals: &[Fr], inverse: bool) -> Result<Vec<Fr>, PolynomialError> {
        self.check_width(vals.len())?;
        let domain = domain(vals.len())?;
        Ok(if inverse {
            domain.ifft(vals)
        } else {
            domain.fft(vals)
        })
    }

    /// FFT over a vector of G1 points, used by the multiproof tables.
    pub fn fft_g1(
        &self,
        vals: &[G1Projective],
        inverse: bool,
    ) -> Result<Vec<G1Projective>, PolynomialError> {
        self.check_width(vals.len())?;
        let domain = domain(vals.len())?;
        Ok(if inverse {
            domain.ifft(vals)
        } else {
            domain.fft(vals)
        })
    }

    /// Evaluates `coeffs` on `shift · <ω_m>` where `m = coeffs.len()`.
    pub fn coset_fft_fr(&self, coeffs: &[Fr], shift: &Fr) -> Result<Vec<Fr>, PolynomialError> {
        let mut scaled = coeffs.to_vec();
        scale_by_powers(&mut scaled, shift);
        self.fft_fr(&scaled, false)
    }

    /// Inverse of [Self::coset_fft_fr].
    pub fn coset_ifft_fr(&self, evals: &[Fr], shift: &Fr) -> Result<Vec<Fr>, PolynomialError> {
        let inv_shift = shift.inverse().ok_or(PolynomialError::DivisionByZero)?;
        let mut coeffs = self.fft_fr(evals, true)?;
        scale_by_powers(&mut coeffs, &inv_shift);
        Ok(coeffs)
    }

    /// Evaluates a chunk polynomial on the coset led by `ω^coset_index`. The
    /// result holds `p(h·ω_l^i)` at index `i`, with `l = coeffs.len()`.
    pub fn interpolation_poly_eval(
        &self,
        coeffs: &[Fr],
        coset_index: u32,
    ) -> Result<Vec<Fr>, PolynomialError> {
        let leader = self.coset_leader(coset_index as u64);
        self.coset_fft_fr(coeffs, &leader)
    }

    /// Interpolates the chunk polynomial from its natural-order evaluations
    /// on the coset led by `ω^coset_index`.
    pub fn interpolation_poly_coeff(
        &self,
        evals: &[Fr],
        coset_index: u32,
    ) -> Result<Vec<Fr>, PolynomialError> {
        let leader = self.coset_leader(coset_index as u64);
        self.coset_ifft_fr(evals, &leader)
    }
}

fn domain(size: usize) -> Result<GeneralEvaluationDomain<Fr>, PolynomialError> {
    GeneralEvaluationDomain::<Fr>::new(size).ok_or_else(|| {
        PolynomialError::FFTError(format!("failed to construct domain of size {}", size))
    })
}

/// Multiplies `vals[i]` by `base^i` in place.
pub fn scale_by_powers(vals: &mut [Fr], base: &Fr) {
    let mut factor = Fr::one();
    for val in vals.iter_mut() {
        *val *= factor;
        factor *= base;
    }
}
