//! Gamma and delta universal integer codes over a [`BitVectorBuilder`]/[`Enumerator`].
//!
//! `write_gamma(n)` writes the unary length of `n + 1` followed by its low bits;
//! `write_gamma_nonzero` specialises for `n >= 1` (no need to add one). Delta
//! prefixes the same payload with a gamma-coded length instead of a unary one,
//! giving better compression for large values.

use crate::bitvector::{BitVectorBuilder, Enumerator};

/// Writes `n` (any `u64`, including zero) as a gamma code.
pub fn write_gamma(b: &mut BitVectorBuilder, n: u64) {
    write_gamma_nonzero(b, n + 1);
}

/// Writes `n >= 1` as a gamma code without the implicit `+1` bias.
pub fn write_gamma_nonzero(b: &mut BitVectorBuilder, n: u64) {
    debug_assert!(n >= 1);
    let len = 64 - n.leading_zeros(); // number of bits in n, i.e. msb(n) + 1
    // unary-code (len - 1) zeros then a 1, matching the source's unary length prefix
    b.zero_extend((len - 1) as usize);
    b.push_back(true);
    if len > 1 {
        b.append_bits(n & ((1u64 << (len - 1)) - 1), len - 1);
    }
}

/// Reads a value written by [`write_gamma`].
pub fn read_gamma(e: &mut Enumerator<'_>) -> u64 {
    read_gamma_nonzero(e) - 1
}

/// Reads a value written by [`write_gamma_nonzero`].
pub fn read_gamma_nonzero(e: &mut Enumerator<'_>) -> u64 {
    let zeros = e.skip_zeros();
    if zeros == 0 {
        1
    } else {
        let low = e.take(zeros as u32);
        (1u64 << zeros) | low
    }
}

/// Writes `n` as a delta code: a gamma-coded bit-length prefix followed by the
/// remaining bits of `n + 1`.
pub fn write_delta(b: &mut BitVectorBuilder, n: u64) {
    let v = n + 1;
    let len = 64 - v.leading_zeros();
    write_gamma_nonzero(b, len as u64);
    if len > 1 {
        b.append_bits(v & ((1u64 << (len - 1)) - 1), len - 1);
    }
}

/// Reads a value written by [`write_delta`].
pub fn read_delta(e: &mut Enumerator<'_>) -> u64 {
    let len = read_gamma_nonzero(e);
    let v = if len > 1 {
        (1u64 << (len - 1)) | e.take((len - 1) as u32)
    } else {
        1
    };
    v - 1
}
