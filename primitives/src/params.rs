use serde::{Deserialize, Serialize};

use crate::{consts::BYTES_PER_SYMBOL, errors::EncodingError, rb};

/// Sizes derived from `(numSys, numPar, dataByteLen)`.
///
/// Every `*_e` and padded size is a power of two. The struct is a plain value
/// and is used as the key of the encoder and verifier caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodingParams {
    pub num_sys: u64,
    pub num_par: u64,
    pub num_node: u64,
    /// Systematic chunk count rounded up to a power of two.
    pub num_sys_e: u64,
    /// Size of the node domain, i.e. the number of cosets.
    pub num_node_e: u64,
    /// Number of field elements of input data.
    pub data_len: u64,
    pub chunk_len: u64,
    pub padded_sys_group_size: u64,
    pub padded_node_group_size: u64,
    pub global_poly_degree: u64,
}

impl EncodingParams {
    /// Derives all encoding sizes. Fails only on a zero systematic or parity
    /// count.
    pub fn new(num_sys: u64, num_par: u64, data_byte_len: u64) -> Result<Self, EncodingError> {
        if num_sys == 0 {
            return Err(EncodingError::ZeroSystematic);
        }
        if num_par == 0 {
            return Err(EncodingError::ZeroParity);
        }

        let num_node = num_sys + num_par;
        let num_sys_e = next_power_of_2(num_sys);
        let ratio = round_up_division(num_node, num_sys);
        let num_node_e = next_power_of_2(num_sys_e * ratio);

        let data_len = round_up_division(data_byte_len, BYTES_PER_SYMBOL as u64);
        let chunk_len = next_power_of_2(round_up_division(data_len, num_sys));

        let padded_sys_group_size = chunk_len * num_sys_e;
        let padded_node_group_size = chunk_len * num_node_e;

        Ok(Self {
            num_sys,
            num_par,
            num_node,
            num_sys_e,
            num_node_e,
            data_len,
            chunk_len,
            padded_sys_group_size,
            padded_node_group_size,
            global_poly_degree: padded_sys_group_size - 1,
        })
    }

    /// Number of frames actually produced: systematic plus parity.
    pub fn num_frames(&self) -> u64 {
        self.num_node
    }

    /// Largest number of frames the node domain can hold once the
    /// `numSys..numSysE` padding slots are set aside.
    pub fn max_frames(&self) -> u64 {
        self.num_node_e - (self.num_sys_e - self.num_sys)
    }

    /// Maps a linear chunk position to its slot in the padded node domain.
    /// Systematic chunks keep their position; parity chunks skip the
    /// `numSys..numSysE` padding slots.
    pub fn slot_of(&self, position: u64) -> Result<u64, EncodingError> {
        if position < self.num_sys {
            Ok(position)
        } else if position < self.max_frames() {
            Ok(position - self.num_sys + self.num_sys_e)
        } else {
            Err(EncodingError::TooManyFrames {
                position,
                max: self.max_frames(),
            })
        }
    }

    /// Leading coset index of the chunk at `position`: the exponent `j` such
    /// that the chunk is evaluated on `ω^j · <ω^numNodeE>`.
    pub fn leading_coset_index(&self, position: u64) -> Result<u32, EncodingError> {
        let slot = self.slot_of(position)?;
        Ok(rb::reverse_bits_limited(self.num_node_e as u32, slot as u32))
    }
}

/// Maps a linear chunk position (systematic chunks first) to its bit-reversed
/// leading coset index in the padded node domain.
pub fn get_leading_coset_index(
    position: u64,
    num_sys: u64,
    num_par: u64,
) -> Result<u32, EncodingError> {
    EncodingParams::new(num_sys, num_par, 0)?.leading_coset_index(position)
}

/// Smallest power of two `>= d`; `next_power_of_2(0) == 1`.
pub fn next_power_of_2(d: u64) -> u64 {
    d.max(1).next_power_of_two()
}

/// `ceil(a / b)` without the `a + b - 1` overflow.
pub fn round_up_division(a: u64, b: u64) -> u64 {
    a / b + u64::from(a % b != 0)
}
