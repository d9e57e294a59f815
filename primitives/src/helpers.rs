use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{BigInteger, Field, PrimeField};
use ark_serialize::CanonicalDeserialize;
use ark_std::{vec, vec::Vec, One, Zero};
use sha3::{Digest, Keccak256};

extern crate alloc;
use alloc::string::ToString;
use core::cmp;

use crate::{
    consts::{
        BYTES_PER_FIELD_ELEMENT, BYTES_PER_SYMBOL, SIZE_OF_G1_AFFINE_COMPRESSED,
        SIZE_OF_G1_AFFINE_UNCOMPRESSED, SIZE_OF_G2_AFFINE_COMPRESSED,
        SIZE_OF_G2_AFFINE_UNCOMPRESSED,
    },
    errors::KzgError,
};

pub fn set_bytes_canonical(data: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(data)
}

pub fn get_num_element(data_len: usize, symbol_size: usize) -> usize {
    data_len.div_ceil(symbol_size)
}

/// Packs bytes into field elements, [BYTES_PER_SYMBOL] bytes per element,
/// interpreted big endian. The last element is right padded with zeros.
pub fn to_fr_array(data: &[u8]) -> Vec<Fr> {
    data.chunks(BYTES_PER_SYMBOL)
        .map(|chunk| {
            if chunk.len() == BYTES_PER_SYMBOL {
                set_bytes_canonical(chunk)
            } else {
                let mut padded = [0u8; BYTES_PER_SYMBOL];
                padded[..chunk.len()].copy_from_slice(chunk);
                set_bytes_canonical(&padded)
            }
        })
        .collect()
}

/// Converts a slice of field elements back to bytes, the inverse of [to_fr_array].
///
/// # Arguments
/// * `data_fr` - Slice of field elements to convert to bytes
/// * `max_output_size` - Maximum allowed size in bytes for the output buffer
///
/// # Returns
/// * `Vec<u8>` - The low [BYTES_PER_SYMBOL] bytes of every element, truncated
///   to `max_output_size`
pub fn to_byte_array(data_fr: &[Fr], max_output_size: usize) -> Vec<u8> {
    let data_size = cmp::min(data_fr.len() * BYTES_PER_SYMBOL, max_output_size);
    let mut data = Vec::with_capacity(data_size);

    for element in data_fr {
        if data.len() >= data_size {
            break;
        }
        let bytes = fr_to_bytes_be(element);
        // the leading byte is always zero for elements produced by to_fr_array
        let symbol = &bytes[BYTES_PER_FIELD_ELEMENT - BYTES_PER_SYMBOL..];
        let take = cmp::min(symbol.len(), data_size - data.len());
        data.extend_from_slice(&symbol[..take]);
    }

    data
}

pub fn is_zeroed(first_byte: u8, buf: &[u8]) -> bool {
    first_byte == 0 && buf.iter().all(|byte| *byte == 0)
}

/// Returns true when `z` is larger than its negation, i.e. `z > (p - 1) / 2`.
pub fn lexicographically_largest(z: &Fq) -> bool {
    z.into_bigint() > Fq::MODULUS_MINUS_ONE_DIV_TWO
}

fn lexicographically_largest_fq2(z: &Fq2) -> bool {
    if z.c1.is_zero() {
        lexicographically_largest(&z.c0)
    } else {
        lexicographically_largest(&z.c1)
    }
}

const MASK: u8 = 0b11 << 6;
const COMPRESSED_INFINITY: u8 = 0b01 << 6;
const COMPRESSED_SMALLEST: u8 = 0b10 << 6;
const COMPRESSED_LARGEST: u8 = 0b11 << 6;

/// Reads a G1 point in the gnark compressed format used by the SRS files:
/// 32 bytes of big-endian X with the two top bits flagging infinity or the
/// sign of Y.
pub fn read_g1_point_from_bytes_be(g1_bytes_be: &[u8]) -> Result<G1Affine, KzgError> {
    if g1_bytes_be.len() != SIZE_OF_G1_AFFINE_COMPRESSED {
        return Err(KzgError::SerializationError(
            "not enough bytes for g1 point".to_string(),
        ));
    }

    let m_data = g1_bytes_be[0] & MASK;

    if m_data == COMPRESSED_INFINITY {
        if !is_zeroed(g1_bytes_be[0] & !MASK, &g1_bytes_be[1..]) {
            return Err(KzgError::SerializationError(
                "point at infinity not coded properly for g1".to_string(),
            ));
        }
        return Ok(G1Affine::zero());
    }

    let mut x_bytes = [0u8; SIZE_OF_G1_AFFINE_COMPRESSED];
    x_bytes.copy_from_slice(g1_bytes_be);
    x_bytes[0] &= !MASK;
    let x = Fq::from_be_bytes_mod_order(&x_bytes);
    let y_squared = x * x * x + Fq::from(3u64);
    let mut y = y_squared
        .sqrt()
        .ok_or_else(|| KzgError::NotOnCurveError("g1 point not on curve".to_string()))?;

    if lexicographically_largest(&y) {
        if m_data == COMPRESSED_SMALLEST {
            y = -y;
        }
    } else if m_data == COMPRESSED_LARGEST {
        y = -y;
    }

    let point = G1Affine::new_unchecked(x, y);
    validate_g1_point(&point)?;
    Ok(point)
}

/// Reads a G2 point in the gnark compressed format: `X.A1 || X.A0`, flags in
/// the top two bits of the first byte.
pub fn read_g2_point_from_bytes_be(g2_bytes_be: &[u8]) -> Result<G2Affine, KzgError> {
    if g2_bytes_be.len() != SIZE_OF_G2_AFFINE_COMPRESSED {
        return Err(KzgError::SerializationError(
            "not enough bytes for g2 point".to_string(),
        ));
    }

    let m_data = g2_bytes_be[0] & MASK;

    if m_data == COMPRESSED_INFINITY {
        if !is_zeroed(g2_bytes_be[0] & !MASK, &g2_bytes_be[1..]) {
            return Err(KzgError::SerializationError(
                "point at infinity not coded properly for g2".to_string(),
            ));
        }
        return Ok(G2Affine::zero());
    }

    let mut x_bytes = [0u8; SIZE_OF_G2_AFFINE_COMPRESSED];
    x_bytes.copy_from_slice(g2_bytes_be);
    x_bytes[0] &= !MASK;
    let half_size = SIZE_OF_G2_AFFINE_COMPRESSED / 2;

    let c1 = Fq::from_be_bytes_mod_order(&x_bytes[..half_size]);
    let c0 = Fq::from_be_bytes_mod_order(&x_bytes[half_size..]);
    let x = Fq2::new(c0, c1);
    let y_squared = x * x * x + g2_b_coeff();
    let mut y = y_squared
        .sqrt()
        .ok_or_else(|| KzgError::NotOnCurveError("g2 point not on curve".to_string()))?;

    if lexicographically_largest_fq2(&y) {
        if m_data == COMPRESSED_SMALLEST {
            y = -y;
        }
    } else if m_data == COMPRESSED_LARGEST {
        y = -y;
    }

    let point = G2Affine::new_unchecked(x, y);
    validate_g2_point(&point)?;
    Ok(point)
}

// b' = 3 / (9 + u)
fn g2_b_coeff() -> Fq2 {
    use ark_ec::short_weierstrass::SWCurveConfig;
    ark_bn254::g2::Config::COEFF_B
}

pub fn fr_to_bytes_be(fr: &Fr) -> [u8; BYTES_PER_FIELD_ELEMENT] {
    let mut out = [0u8; BYTES_PER_FIELD_ELEMENT];
    out.copy_from_slice(&fr.into_bigint().to_bytes_be());
    out
}

fn fq_to_bytes_be(fq: &Fq) -> [u8; BYTES_PER_FIELD_ELEMENT] {
    let mut out = [0u8; BYTES_PER_FIELD_ELEMENT];
    out.copy_from_slice(&fq.into_bigint().to_bytes_be());
    out
}

/// Reads a canonical big-endian scalar. Values at or above the modulus are
/// rejected rather than reduced.
pub fn fr_from_bytes_be(bytes: &[u8]) -> Result<Fr, KzgError> {
    if bytes.len() != BYTES_PER_FIELD_ELEMENT {
        return Err(KzgError::InvalidInputLength);
    }
    let mut bytes_le = [0u8; BYTES_PER_FIELD_ELEMENT];
    bytes_le.copy_from_slice(bytes);
    bytes_le.reverse();
    Fr::deserialize_uncompressed(&bytes_le[..])
        .map_err(|e| KzgError::InvalidFieldElement(e.to_string()))
}

fn fq_from_bytes_be(bytes: &[u8]) -> Result<Fq, KzgError> {
    let mut bytes_le = [0u8; BYTES_PER_FIELD_ELEMENT];
    bytes_le.copy_from_slice(bytes);
    bytes_le.reverse();
    Fq::deserialize_uncompressed(&bytes_le[..])
        .map_err(|e| KzgError::InvalidFieldElement(e.to_string()))
}

/// Serializes a G1 point as `X || Y`, 32 bytes each, big endian. The point at
/// infinity is 64 zero bytes.
pub fn serialize_g1_be(point: &G1Affine) -> [u8; SIZE_OF_G1_AFFINE_UNCOMPRESSED] {
    let mut out = [0u8; SIZE_OF_G1_AFFINE_UNCOMPRESSED];
    if point.infinity {
        return out;
    }
    out[..32].copy_from_slice(&fq_to_bytes_be(&point.x));
    out[32..].copy_from_slice(&fq_to_bytes_be(&point.y));
    out
}

pub fn deserialize_g1_be(bytes: &[u8]) -> Result<G1Affine, KzgError> {
    if bytes.len() != SIZE_OF_G1_AFFINE_UNCOMPRESSED {
        return Err(KzgError::InvalidInputLength);
    }
    if bytes.iter().all(|b| *b == 0) {
        return Ok(G1Affine::identity());
    }
    let x = fq_from_bytes_be(&bytes[..32])?;
    let y = fq_from_bytes_be(&bytes[32..])?;
    let point = G1Affine::new_unchecked(x, y);
    validate_g1_point(&point)?;
    Ok(point)
}

/// Serializes a G2 point as `X.A0 || X.A1 || Y.A0 || Y.A1`, 32 bytes each.
pub fn serialize_g2_be(point: &G2Affine) -> [u8; SIZE_OF_G2_AFFINE_UNCOMPRESSED] {
    let mut out = [0u8; SIZE_OF_G2_AFFINE_UNCOMPRESSED];
    if point.infinity {
        return out;
    }
    out[..32].copy_from_slice(&fq_to_bytes_be(&point.x.c0));
    out[32..64].copy_from_slice(&fq_to_bytes_be(&point.x.c1));
    out[64..96].copy_from_slice(&fq_to_bytes_be(&point.y.c0));
    out[96..].copy_from_slice(&fq_to_bytes_be(&point.y.c1));
    out
}

pub fn deserialize_g2_be(bytes: &[u8]) -> Result<G2Affine, KzgError> {
    if bytes.len() != SIZE_OF_G2_AFFINE_UNCOMPRESSED {
        return Err(KzgError::InvalidInputLength);
    }
    if bytes.iter().all(|b| *b == 0) {
        return Ok(G2Affine::identity());
    }
    let x = Fq2::new(fq_from_bytes_be(&bytes[..32])?, fq_from_bytes_be(&bytes[32..64])?);
    let y = Fq2::new(
        fq_from_bytes_be(&bytes[64..96])?,
        fq_from_bytes_be(&bytes[96..])?,
    );
    let point = G2Affine::new_unchecked(x, y);
    validate_g2_point(&point)?;
    Ok(point)
}

/// Checks that a G1 point is on the curve and in the prime-order subgroup.
/// The identity is accepted: it is the commitment of the zero polynomial.
pub fn validate_g1_point(point: &G1Affine) -> Result<(), KzgError> {
    if point.is_zero() {
        return Ok(());
    }

    if !point.is_on_curve() {
        return Err(KzgError::NotOnCurveError(
            "G1 point not on curve".to_string(),
        ));
    }

    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(KzgError::NotOnCurveError(
            "G1 point not in correct subgroup".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_g2_point(point: &G2Affine) -> Result<(), KzgError> {
    if point.is_zero() {
        return Ok(());
    }

    if !point.is_on_curve() {
        return Err(KzgError::NotOnCurveError(
            "G2 point not on curve".to_string(),
        ));
    }

    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(KzgError::NotOnCurveError(
            "G2 point not in correct subgroup".to_string(),
        ));
    }

    Ok(())
}

/// Computes powers of a field element up to a given exponent.
///
/// For a given field element x, computes [1, x, x², x³, ..., x^(count-1)]
pub fn compute_powers(base: &Fr, count: usize) -> Vec<Fr> {
    let mut powers = Vec::with_capacity(count);
    let mut current = Fr::one();
    for _ in 0..count {
        powers.push(current);
        current *= base;
    }
    powers
}

/// Computes a linear combination of G1 points weighted by scalar coefficients.
///
/// Given points P₁, P₂, ..., Pₙ and scalars s₁, s₂, ..., sₙ
/// Computes: s₁P₁ + s₂P₂ + ... + sₙPₙ
/// Uses Multi-Scalar Multiplication (MSM) for efficient computation.
///
/// # Arguments
/// * `points` - Array of G1 points in affine form
/// * `scalars` - Array of field elements as scalar weights
///
/// # Returns
/// * Single G1 point in affine form representing the linear combination
pub fn g1_lincomb(points: &[G1Affine], scalars: &[Fr]) -> Result<G1Affine, KzgError> {
    let lincomb =
        G1Projective::msm(points, scalars).map_err(|e| KzgError::MsmError(e.to_string()))?;
    Ok(lincomb.into_affine())
}

/// Same as [g1_lincomb] over G2.
pub fn g2_lincomb(points: &[G2Affine], scalars: &[Fr]) -> Result<G2Affine, KzgError> {
    let lincomb =
        G2Projective::msm(points, scalars).map_err(|e| KzgError::MsmError(e.to_string()))?;
    Ok(lincomb.into_affine())
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Maps a byte slice to a field element through Keccak-256, reducing the
/// big-endian digest modulo r.
pub fn hash_to_field_element(msg: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(&keccak256(msg))
}

/// Checks `e(a1, a2) == e(b1, b2)` with a single multi pairing.
pub fn pairings_verify(a1: G1Affine, a2: G2Affine, b1: G1Affine, b2: G2Affine) -> bool {
    let neg_b1 = -b1;
    let p = [a1, neg_b1];
    let q = [a2, b2];
    let result = Bn254::multi_pairing(p, q);
    result.is_zero()
}

/// Evaluates a polynomial in coefficient form at `x` (Horner).
pub fn eval_poly_at(coeffs: &[Fr], x: &Fr) -> Fr {
    coeffs
        .iter()
        .rev()
        .fold(Fr::zero(), |acc, coeff| acc * x + coeff)
}

/// Left pads `bytes` with zeros to `size`. Longer inputs keep their low bytes.
pub fn pack_to(bytes: &[u8], size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    let take = cmp::min(bytes.len(), size);
    out[size - take..].copy_from_slice(&bytes[bytes.len() - take..]);
    out
}
