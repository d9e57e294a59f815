//! Bit-reversal permutation.
//!
//! A radix-2 FFT emits evaluations in natural order, but chunk `s` of the
//! encoded data lives on the coset led by `ω^{rb(s)}`. Reversing the whole
//! evaluation vector groups each coset into one contiguous slice, which is
//! what lets systematic chunks be spliced in and parity chunks be sliced out
//! without any further index arithmetic.

use crate::errors::PolynomialError;

extern crate alloc;
use alloc::format;

/// Reverses the low `log2(length)` bits of `value`. `length` must be a power
/// of two; for `length <= 1` the only index is 0.
pub fn reverse_bits_limited(length: u32, value: u32) -> u32 {
    if length <= 1 {
        return 0;
    }
    let used_bits = 32 - (length - 1).leading_zeros();
    value.reverse_bits() >> (32 - used_bits)
}

/// Same as [reverse_bits_limited] for 64-bit indices.
pub fn reverse_bits_limited_u64(length: u64, value: u64) -> u64 {
    if length <= 1 {
        return 0;
    }
    let used_bits = 64 - (length - 1).leading_zeros();
    value.reverse_bits() >> (64 - used_bits)
}

/// Permutes `values` in place so that element `i` moves to `rb(i)`.
/// The permutation is an involution: applying it twice restores the input.
pub fn reverse_bit_order<T>(values: &mut [T]) -> Result<(), PolynomialError> {
    let n = values.len();
    if n == 0 || !n.is_power_of_two() {
        return Err(PolynomialError::FFTError(format!(
            "reverse bit order requires a power of two length, got {}",
            n
        )));
    }
    if n == 1 {
        return Ok(());
    }
    let unused_bits = usize::BITS - n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> unused_bits;
        if i < j {
            values.swap(i, j);
        }
    }
    Ok(())
}
