use std::collections::BTreeMap;

use ark_bn254::Fr;
use ark_ff::{batch_inversion, FftField, Field};
use ark_std::{One, Zero};
use datalayr_primitives::{
    errors::EncodingError,
    fft::FFTSettings,
    helpers::to_byte_array,
    params::EncodingParams,
    polynomial::vanishing_poly,
    rb::reverse_bits_limited,
};
use tracing::{debug, trace};

/// Reconstructs the original bytes from any `numSys` distinct chunks.
///
/// Chunks are addressed by their linear position (systematic first), the
/// same positions the encoder produced them at.
#[derive(Clone, Debug)]
pub struct Decoder {
    pub params: EncodingParams,
    pub fs: FFTSettings,
}

impl Decoder {
    pub fn new(params: EncodingParams) -> Result<Self, EncodingError> {
        let fs = FFTSettings::new(params.padded_node_group_size as usize)?;
        Ok(Self { params, fs })
    }

    /// Dispatches to [Self::decode_sys] when every systematic chunk is
    /// present and to [Self::decode] otherwise.
    pub fn decode_safe<C: AsRef<[Fr]>>(
        &self,
        chunks: &[C],
        positions: &[u64],
        byte_len: usize,
    ) -> Result<Vec<u8>, EncodingError> {
        let by_position = self.index_chunks(chunks, positions)?;
        if (0..self.params.num_sys).all(|p| by_position.contains_key(&p)) {
            trace!("all systematic chunks present");
            self.systematic_bytes(&by_position, byte_len)
        } else {
            self.recover_bytes(&by_position, byte_len)
        }
    }

    /// Fast path: concatenates the systematic chunks.
    pub fn decode_sys<C: AsRef<[Fr]>>(
        &self,
        chunks: &[C],
        positions: &[u64],
        byte_len: usize,
    ) -> Result<Vec<u8>, EncodingError> {
        let by_position = self.index_chunks(chunks, positions)?;
        self.systematic_bytes(&by_position, byte_len)
    }

    /// General path: erasure recovery from any `numSys` distinct chunks.
    pub fn decode<C: AsRef<[Fr]>>(
        &self,
        chunks: &[C],
        positions: &[u64],
        byte_len: usize,
    ) -> Result<Vec<u8>, EncodingError> {
        let by_position = self.index_chunks(chunks, positions)?;
        self.recover_bytes(&by_position, byte_len)
    }

    /// Validates lengths and positions and drops duplicates, keeping the
    /// first chunk seen for each position.
    fn index_chunks<'a, C: AsRef<[Fr]>>(
        &self,
        chunks: &'a [C],
        positions: &[u64],
    ) -> Result<BTreeMap<u64, &'a [Fr]>, EncodingError> {
        if chunks.len() != positions.len() {
            return Err(EncodingError::LengthMismatch {
                frames: chunks.len(),
                positions: positions.len(),
            });
        }
        let l = self.params.chunk_len as usize;
        let mut by_position = BTreeMap::new();
        for (chunk, &position) in chunks.iter().zip(positions) {
            let coeffs = chunk.as_ref();
            if coeffs.len() != l {
                return Err(EncodingError::FrameLengthMismatch {
                    expected: l,
                    got: coeffs.len(),
                });
            }
            if position >= self.params.num_frames() {
                return Err(EncodingError::TooManyFrames {
                    position,
                    max: self.params.num_frames(),
                });
            }
            by_position.entry(position).or_insert(coeffs);
        }
        Ok(by_position)
    }

    fn systematic_bytes(
        &self,
        by_position: &BTreeMap<u64, &[Fr]>,
        byte_len: usize,
    ) -> Result<Vec<u8>, EncodingError> {
        let num_sys = self.params.num_sys as usize;
        let mut data = Vec::with_capacity(num_sys * self.params.chunk_len as usize);
        for position in 0..self.params.num_sys {
            let chunk = by_position
                .get(&position)
                .ok_or(EncodingError::MissingSystematicFrames {
                    got: by_position.range(..self.params.num_sys).count(),
                    need: num_sys,
                })?;
            data.extend_from_slice(chunk);
        }
        Ok(to_byte_array(&data, byte_len))
    }

    fn recover_bytes(
        &self,
        by_position: &BTreeMap<u64, &[Fr]>,
        byte_len: usize,
    ) -> Result<Vec<u8>, EncodingError> {
        let need = self.params.num_sys as usize;
        if by_position.len() < need {
            return Err(EncodingError::InsufficientFrames {
                got: by_position.len(),
                need,
            });
        }
        let coeffs = self.recover_global_coeffs(by_position)?;

        let mut data = Vec::with_capacity(need * self.params.chunk_len as usize);
        for slot in 0..self.params.num_sys {
            data.extend(self.remainder_on_slot(&coeffs, slot));
        }
        Ok(to_byte_array(&data, byte_len))
    }

    /// Recovers the coefficients of the global polynomial.
    ///
    /// Known evaluations `E` are placed on the full node domain, missing
    /// cosets are zero. With `Z` vanishing on exactly the missing cosets,
    /// `E·Z = P·Z` on the whole domain, so `P = (E·Z) / Z` evaluated on a
    /// shifted coset where `Z` has no roots.
    fn recover_global_coeffs(
        &self,
        by_position: &BTreeMap<u64, &[Fr]>,
    ) -> Result<Vec<Fr>, EncodingError> {
        let l = self.params.chunk_len as usize;
        let n = self.params.padded_node_group_size as usize;
        let m = self.params.padded_sys_group_size as usize;
        let num_node_e = self.params.num_node_e as usize;

        let mut evals = vec![Fr::zero(); n];
        let mut present = vec![false; num_node_e];

        for (&position, coeffs) in by_position {
            let coset = self.params.leading_coset_index(position)? as usize;
            let coset_evals = self.fs.interpolation_poly_eval(coeffs, coset as u32)?;
            for (j, v) in coset_evals.into_iter().enumerate() {
                evals[coset + num_node_e * j] = v;
            }
            present[coset] = true;
        }
        // the zero-padded systematic slots evaluate to zero
        for slot in self.params.num_sys..self.params.num_sys_e {
            let coset = reverse_bits_limited(num_node_e as u32, slot as u32) as usize;
            present[coset] = true;
        }

        let missing: Vec<Fr> = present
            .iter()
            .enumerate()
            .filter(|(_, p)| !**p)
            .map(|(coset, _)| self.fs.coset_leader((coset * l) as u64))
            .collect();
        debug!(
            received = by_position.len(),
            missing = missing.len(),
            "recovering global polynomial"
        );

        let mut coeffs = if missing.is_empty() {
            self.fs.fft_fr(&evals, true)?
        } else {
            let mut zero_poly = vanishing_poly(l, &missing);
            zero_poly.resize(n, Fr::zero());
            let zero_evals = self.fs.fft_fr(&zero_poly, false)?;

            let ez: Vec<Fr> = evals
                .iter()
                .zip(&zero_evals)
                .map(|(e, z)| *e * z)
                .collect();
            let pz = self.fs.fft_fr(&ez, true)?;

            let shift = Fr::GENERATOR;
            let pz_shifted = self.fs.coset_fft_fr(&pz, &shift)?;
            let mut z_shifted = self.fs.coset_fft_fr(&zero_poly, &shift)?;
            if z_shifted.iter().any(Zero::is_zero) {
                return Err(EncodingError::RecoveryFailed(
                    "zero polynomial vanishes on the shifted coset".to_string(),
                ));
            }
            batch_inversion(&mut z_shifted);
            let quotient: Vec<Fr> = pz_shifted
                .iter()
                .zip(&z_shifted)
                .map(|(a, b)| *a * b)
                .collect();
            self.fs.coset_ifft_fr(&quotient, &shift)?
        };

        if coeffs[m..].iter().any(|c| !c.is_zero()) {
            return Err(EncodingError::RecoveryFailed(
                "recovered polynomial exceeds the systematic degree".to_string(),
            ));
        }
        coeffs.truncate(m);
        Ok(coeffs)
    }

    /// Interpolation polynomial of `coeffs` on the coset of `slot`, i.e. the
    /// remainder modulo `x^l - h^l`.
    fn remainder_on_slot(&self, coeffs: &[Fr], slot: u64) -> Vec<Fr> {
        let l = self.params.chunk_len as usize;
        let coset = reverse_bits_limited(self.params.num_node_e as u32, slot as u32);
        let c = self.fs.coset_leader(coset as u64).pow([l as u64]);

        let mut remainder = vec![Fr::zero(); l];
        let mut factor = Fr::one();
        for block in coeffs.chunks(l) {
            for (r, v) in remainder.iter_mut().zip(block) {
                *r += *v * factor;
            }
            factor *= c;
        }
        remainder
    }
}
