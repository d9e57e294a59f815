use ark_bn254::Fr;
use ark_std::Zero;
use datalayr_primitives::{
    errors::EncodingError,
    fft::FFTSettings,
    helpers::to_fr_array,
    params::EncodingParams,
    polynomial::GlobalPoly,
    rb::{reverse_bit_order, reverse_bits_limited},
};
use rayon::prelude::*;
use tracing::trace;

/// Output of [Encoder::encode]: the global polynomial and, for every chunk
/// position `0..numSys+numPar`, its interpolation coefficients and leading
/// coset index.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedChunks {
    pub poly: GlobalPoly,
    pub chunks: Vec<Vec<Fr>>,
    pub indices: Vec<u32>,
}

/// Systematic Reed-Solomon encoder over the BN254 scalar field.
///
/// Systematic chunks are the data itself, read as coefficients of the chunk
/// interpolation polynomials. Parity chunks are the interpolation polynomials
/// of the global polynomial on the remaining cosets.
#[derive(Clone, Debug)]
pub struct Encoder {
    pub params: EncodingParams,
    pub fs: FFTSettings,
    pub verbose: bool,
}

impl Encoder {
    pub fn new(params: EncodingParams, verbose: bool) -> Result<Self, EncodingError> {
        if params.num_sys_e + params.num_par > params.num_node_e {
            return Err(EncodingError::TooManyFrames {
                position: params.num_sys_e + params.num_par,
                max: params.num_node_e,
            });
        }
        let fs = FFTSettings::new(params.padded_node_group_size as usize)?;
        Ok(Self {
            params,
            fs,
            verbose,
        })
    }

    pub fn encode_bytes(&self, data: &[u8]) -> Result<EncodedChunks, EncodingError> {
        self.encode(&to_fr_array(data))
    }

    pub fn encode(&self, input_fr: &[Fr]) -> Result<EncodedChunks, EncodingError> {
        let l = self.params.chunk_len as usize;
        let capacity = self.params.num_sys as usize * l;
        if input_fr.len() > capacity {
            return Err(EncodingError::InputTooLarge {
                len: input_fr.len(),
                capacity,
            });
        }

        let mut padded = input_fr.to_vec();
        padded.resize(self.params.padded_sys_group_size as usize, Fr::zero());
        let poly = self.global_poly(&padded)?;

        let num_sys = self.params.num_sys as usize;
        let num_chunks = self.params.num_frames() as usize;
        let mut chunks: Vec<Vec<Fr>> = padded[..num_sys * l]
            .chunks(l)
            .map(<[Fr]>::to_vec)
            .collect();
        let parity = (num_sys..num_chunks)
            .into_par_iter()
            .map(|position| self.parity_chunk(&poly, position as u64))
            .collect::<Result<Vec<_>, _>>()?;
        chunks.extend(parity);
        let indices = (0..num_chunks as u64)
            .map(|position| self.params.leading_coset_index(position))
            .collect::<Result<Vec<_>, _>>()?;

        if self.verbose {
            trace!(
                num_sys = self.params.num_sys,
                num_par = self.params.num_par,
                chunk_len = l,
                "encoded chunks"
            );
        }

        Ok(EncodedChunks {
            poly,
            chunks,
            indices,
        })
    }

    /// Builds the global polynomial whose restriction to the coset of every
    /// systematic slot interpolates that slot's data chunk.
    fn global_poly(&self, padded: &[Fr]) -> Result<GlobalPoly, EncodingError> {
        let l = self.params.chunk_len as usize;
        let m = self.params.padded_sys_group_size as usize;
        let n = self.params.padded_node_group_size as usize;
        let num_node_e = self.params.num_node_e as u32;

        let mut sys_values = vec![Fr::zero(); m];
        for (slot, chunk) in padded.chunks(l).enumerate() {
            let coset = reverse_bits_limited(num_node_e, slot as u32);
            let mut evals = self.fs.interpolation_poly_eval(chunk, coset)?;
            reverse_bit_order(&mut evals)?;
            sys_values[slot * l..(slot + 1) * l].copy_from_slice(&evals);
        }
        reverse_bit_order(&mut sys_values)?;
        let coeffs = self.fs.fft_fr(&sys_values, true)?;

        let mut extended = coeffs.clone();
        extended.resize(n, Fr::zero());
        let mut values = self.fs.fft_fr(&extended, false)?;
        reverse_bit_order(&mut values)?;

        Ok(GlobalPoly::new(coeffs, values))
    }

    /// Interpolates a parity chunk from its slice of the bit-reversed
    /// extended evaluations.
    fn parity_chunk(&self, poly: &GlobalPoly, position: u64) -> Result<Vec<Fr>, EncodingError> {
        let l = self.params.chunk_len as usize;
        let slot = self.params.slot_of(position)? as usize;
        let coset = self.params.leading_coset_index(position)?;

        let mut evals = poly
            .chunk_values(slot, l)
            .ok_or(EncodingError::TooManyFrames {
                position,
                max: self.params.max_frames(),
            })?
            .to_vec();
        reverse_bit_order(&mut evals)?;
        Ok(self.fs.interpolation_poly_coeff(&evals, coset)?)
    }
}
