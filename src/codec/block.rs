//! The fixed-block codec interface and its reference
//! implementation: a bit-packed block with a per-block bit-width byte, falling
//! back to a variable-byte tail for a list's final, possibly-short block.
//!
//! Grounded on `rank-retrieve/src/persistence/codec.rs`'s `bitpack` module
//! (LSB-first bit packing across byte boundaries) and `varint` module (reused
//! here as [`crate::codec::tvb`]).

use crate::codec::tvb;

/// Number of postings per block. This crate hard-codes a single block codec
/// rather than supporting codec plurality at query time.
pub const BLOCK_SIZE: usize = 128;

/// Encodes and decodes a fixed block of postings: `encode`/`decode`
/// over exactly `count` values (`count < BLOCK_SIZE` only for a list's final
/// block), all `< universe`. `decode(encode(x)) == x` regardless of the
/// `universe` hint.
pub trait BlockCodec {
    /// Appends the encoding of `values[..count]` to `out`.
    fn encode(values: &[u32], universe: u32, count: usize, out: &mut Vec<u8>);

    /// Decodes `count` values from the start of `data` into `out_buf[..count]`,
    /// returning the number of bytes consumed.
    fn decode(data: &[u8], out_buf: &mut [u32], universe: u32, count: usize) -> usize;
}

/// The reference SIMD-friendly bit-packed codec.
pub struct BitpackedBlockCodec;

fn bit_width(value: u32) -> u8 {
    if value == 0 {
        0
    } else {
        32 - value.leading_zeros() as u8
    }
}

fn bit_width_many(values: &[u32]) -> u8 {
    values.iter().copied().map(bit_width).max().unwrap_or(0)
}

fn packed_len_bytes(count: usize, width: u8) -> usize {
    (count * width as usize + 7) / 8
}

fn pack(values: &[u32], width: u8, out: &mut Vec<u8>) {
    if width == 0 {
        return;
    }
    let mut acc: u64 = 0;
    let mut acc_bits: u32 = 0;
    for &v in values {
        acc |= (v as u64) << acc_bits;
        acc_bits += width as u32;
        while acc_bits >= 8 {
            out.push((acc & 0xff) as u8);
            acc >>= 8;
            acc_bits -= 8;
        }
    }
    if acc_bits > 0 {
        out.push((acc & 0xff) as u8);
    }
}

fn unpack(data: &[u8], count: usize, width: u8, out_buf: &mut [u32]) {
    if width == 0 {
        for slot in out_buf.iter_mut().take(count) {
            *slot = 0;
        }
        return;
    }
    let mut acc: u64 = 0;
    let mut acc_bits: u32 = 0;
    let mut byte_idx = 0usize;
    let mask: u64 = if width == 32 { u32::MAX as u64 } else { (1u64 << width) - 1 };
    for slot in out_buf.iter_mut().take(count) {
        while acc_bits < width as u32 {
            acc |= (data[byte_idx] as u64) << acc_bits;
            byte_idx += 1;
            acc_bits += 8;
        }
        *slot = (acc & mask) as u32;
        acc >>= width;
        acc_bits -= width as u32;
    }
}

impl BlockCodec for BitpackedBlockCodec {
    fn encode(values: &[u32], _universe: u32, count: usize, out: &mut Vec<u8>) {
        if count == BLOCK_SIZE {
            let width = bit_width_many(&values[..count]);
            out.push(width);
            pack(&values[..count], width, out);
        } else {
            for &v in &values[..count] {
                tvb::encode(v as u64, out);
            }
        }
    }

    fn decode(data: &[u8], out_buf: &mut [u32], _universe: u32, count: usize) -> usize {
        if count == BLOCK_SIZE {
            let width = data[0];
            unpack(&data[1..], count, width, out_buf);
            1 + packed_len_bytes(count, width)
        } else {
            let mut consumed = 0;
            for slot in out_buf.iter_mut().take(count) {
                let (v, c) = tvb::decode(&data[consumed..]);
                *slot = v as u32;
                consumed += c;
            }
            consumed
        }
    }
}
