use ark_bn254::Fr;
use ark_ff::Field;
use ark_std::{vec, vec::Vec, Zero};

use crate::errors::PolynomialError;

/// The global polynomial of one encoded blob, in both forms.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalPoly {
    /// coeffs has `paddedSysGroupSize` entries: the degree bound the
    /// low-degree proof attests to.
    coeffs: Vec<Fr>,
    /// values holds the evaluations over the full `paddedNodeGroupSize`
    /// domain, in bit-reversed order so that each chunk's coset is one
    /// contiguous slice of `chunkLen` values.
    values: Vec<Fr>,
}

impl GlobalPoly {
    pub fn new(coeffs: Vec<Fr>, values: Vec<Fr>) -> Self {
        Self { coeffs, values }
    }

    pub fn coeffs(&self) -> &[Fr] {
        &self.coeffs
    }

    pub fn values(&self) -> &[Fr] {
        &self.values
    }

    /// Bit-reversed evaluations belonging to the chunk in padded slot `slot`.
    pub fn chunk_values(&self, slot: usize, chunk_len: usize) -> Option<&[Fr]> {
        self.values.get(slot * chunk_len..(slot + 1) * chunk_len)
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }
}

/// Multiplies `f` by the coset vanishing polynomial `x^chunk_len - root_pow`,
/// where `root_pow` is `h^chunk_len` for coset leader `h`. The result has
/// `f.len() + chunk_len` coefficients.
pub fn zero_poly_mul(f: &[Fr], chunk_len: usize, root_pow: &Fr) -> Vec<Fr> {
    let mut prod = vec![Fr::zero(); f.len() + chunk_len];
    for (i, c) in f.iter().enumerate() {
        prod[i + chunk_len] += c;
        prod[i] -= *c * root_pow;
    }
    prod
}

/// `Π (x^chunk_len - r)` over every `r` in `root_pows`, starting from the
/// constant polynomial 1.
pub fn vanishing_poly(chunk_len: usize, root_pows: &[Fr]) -> Vec<Fr> {
    root_pows
        .iter()
        .fold(vec![Fr::ONE], |acc, r| zero_poly_mul(&acc, chunk_len, r))
}

/// Quotient of polynomial long division. The remainder is dropped; callers
/// that care about exactness check it through a commitment.
pub fn poly_long_div(dividend: &[Fr], divisor: &[Fr]) -> Result<Vec<Fr>, PolynomialError> {
    let divisor = trim(divisor);
    let lead = divisor
        .last()
        .copied()
        .filter(|c| !c.is_zero())
        .ok_or(PolynomialError::DivisionByZero)?;
    let lead_inv = lead.inverse().ok_or(PolynomialError::DivisionByZero)?;

    let dividend = trim(dividend);
    if dividend.len() < divisor.len() {
        return Ok(vec![Fr::zero()]);
    }

    let mut rem = dividend.to_vec();
    let shift_max = dividend.len() - divisor.len();
    let mut quotient = vec![Fr::zero(); shift_max + 1];
    for shift in (0..=shift_max).rev() {
        let factor = rem[shift + divisor.len() - 1] * lead_inv;
        quotient[shift] = factor;
        if factor.is_zero() {
            continue;
        }
        for (j, d) in divisor.iter().enumerate() {
            rem[shift + j] -= factor * d;
        }
    }
    Ok(quotient)
}

/// Synthetic division by `x - z`: returns the coefficients of
/// `(p(x) - p(z)) / (x - z)`.
pub fn divide_by_linear(coeffs: &[Fr], z: &Fr) -> Vec<Fr> {
    if coeffs.len() <= 1 {
        return vec![Fr::zero()];
    }
    let mut quotient = vec![Fr::zero(); coeffs.len() - 1];
    let mut carry = Fr::zero();
    for i in (1..coeffs.len()).rev() {
        carry = coeffs[i] + carry * z;
        quotient[i - 1] = carry;
    }
    quotient
}

pub fn poly_mul(a: &[Fr], b: &[Fr]) -> Vec<Fr> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![Fr::zero(); a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        if x.is_zero() {
            continue;
        }
        for (j, y) in b.iter().enumerate() {
            out[i + j] += *x * y;
        }
    }
    out
}

fn trim(poly: &[Fr]) -> &[Fr] {
    let len = poly.iter().rposition(|c| !c.is_zero()).map_or(0, |i| i + 1);
    &poly[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::eval_poly_at;

    fn fr(v: u64) -> Fr {
        Fr::from(v)
    }

    #[test]
    fn test_zero_poly_mul_vanishes_on_coset() {
        // (x^2 - 4) vanishes at 2 and -2
        let prod = zero_poly_mul(&[Fr::ONE], 2, &fr(4));
        assert_eq!(prod, vec![-fr(4), Fr::zero(), Fr::ONE]);
        assert!(eval_poly_at(&prod, &fr(2)).is_zero());
        assert!(eval_poly_at(&prod, &-fr(2)).is_zero());

        let f = vec![fr(3), fr(5)];
        let prod = zero_poly_mul(&f, 4, &fr(7));
        let x = fr(11);
        let want = eval_poly_at(&f, &x) * (x.pow([4]) - fr(7));
        assert_eq!(eval_poly_at(&prod, &x), want);
    }

    #[test]
    fn test_vanishing_poly_degree() {
        let v = vanishing_poly(4, &[fr(2), fr(3), fr(5)]);
        assert_eq!(v.len(), 13);
        assert_eq!(v[12], Fr::ONE);
        assert_eq!(vanishing_poly(4, &[]), vec![Fr::ONE]);
    }

    #[test]
    fn test_poly_long_div_exact() {
        let a = vec![fr(1), fr(2), fr(3)];
        let b = vec![fr(4), fr(0), fr(1), fr(9)];
        let prod = poly_mul(&a, &b);
        assert_eq!(poly_long_div(&prod, &b).unwrap(), a);
        assert_eq!(poly_long_div(&prod, &a).unwrap(), b);
    }

    #[test]
    fn test_poly_long_div_by_zero() {
        assert_eq!(
            poly_long_div(&[fr(1)], &[Fr::zero(), Fr::zero()]),
            Err(PolynomialError::DivisionByZero)
        );
    }

    #[test]
    fn test_divide_by_linear() {
        let p = vec![fr(7), fr(0), fr(2), fr(5)];
        let z = fr(3);
        let q = divide_by_linear(&p, &z);
        let x = fr(10);
        let lhs = eval_poly_at(&q, &x) * (x - z);
        let rhs = eval_poly_at(&p, &x) - eval_poly_at(&p, &z);
        assert_eq!(lhs, rhs);
    }
}
