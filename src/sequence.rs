//! Monotone-sequence encoding: three representations of a strictly increasing
//! sequence of `n` values drawn from `[0, U)`, with a dispatcher that always
//! picks whichever is smallest in bits.
//!
//! No reference implementation of compact Elias-Fano or the compact ranked
//! bitvector survived retrieval for this corpus, so the layouts below follow
//! the governing design document's formulas directly rather than a ported
//! `.hpp`. Pointer/rank sample tables are kept as plain `Vec<u64>` rather than
//! bit-packed at the prescribed widths: this format is self-contained and
//! never needs to interoperate byte-for-byte with another implementation, so
//! only decode correctness and the relative size comparison need to match
//! the formulas; see `size_in_bits` on each representation.

use crate::broadword::{ceil_log2, msb};
use crate::bitvector::{BitVector, BitVectorBuilder};
use crate::config::IndexConfig;

/// A strictly increasing sequence of `n` values in `[0, U)`, stored as
/// whichever of three representations was smallest at build time.
#[derive(Debug, Clone)]
pub enum MonotoneSequence {
    EliasFano(CompactEliasFano),
    RankedBitvector(CompactRankedBitvector),
    AllOnes(AllOnesSequence),
}

impl MonotoneSequence {
    /// Builds the cheapest representation of `values` (strictly increasing,
    /// all `< universe`) under `cfg`'s sampling rates.
    pub fn build(values: &[u64], universe: u64, cfg: &IndexConfig) -> Self {
        let n = values.len() as u64;
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]), "values must be strictly increasing");
        debug_assert!(values.iter().all(|&v| v < universe), "values must be < universe");

        if n == universe {
            return MonotoneSequence::AllOnes(AllOnesSequence { universe });
        }

        let ef_bits = CompactEliasFano::estimate_size_in_bits(n, universe, cfg);
        let rb_bits = CompactRankedBitvector::estimate_size_in_bits(n, universe, cfg);

        if ef_bits <= rb_bits {
            MonotoneSequence::EliasFano(CompactEliasFano::build(values, universe, cfg))
        } else {
            MonotoneSequence::RankedBitvector(CompactRankedBitvector::build(values, universe, cfg))
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MonotoneSequence::EliasFano(s) => s.n as usize,
            MonotoneSequence::RankedBitvector(s) => s.n as usize,
            MonotoneSequence::AllOnes(s) => s.universe as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn universe(&self) -> u64 {
        match self {
            MonotoneSequence::EliasFano(s) => s.universe,
            MonotoneSequence::RankedBitvector(s) => s.universe,
            MonotoneSequence::AllOnes(s) => s.universe,
        }
    }

    /// `move(i)`: the value at 0-based index `i`.
    pub fn get(&self, i: usize) -> u64 {
        match self {
            MonotoneSequence::EliasFano(s) => s.get(i),
            MonotoneSequence::RankedBitvector(s) => s.get(i),
            MonotoneSequence::AllOnes(_) => i as u64,
        }
    }

    /// First `(index, value)` with `value >= lb`, or `None` past the end.
    pub fn next_geq(&self, lb: u64) -> Option<(usize, u64)> {
        match self {
            MonotoneSequence::EliasFano(s) => s.next_geq(lb),
            MonotoneSequence::RankedBitvector(s) => s.next_geq(lb),
            MonotoneSequence::AllOnes(s) => {
                if lb < s.universe {
                    Some((lb as usize, lb))
                } else {
                    None
                }
            }
        }
    }

    /// Total size of the payload, in bits, excluding the one-bit discriminator.
    pub fn size_in_bits(&self) -> u64 {
        match self {
            MonotoneSequence::EliasFano(s) => s.size_in_bits(),
            MonotoneSequence::RankedBitvector(s) => s.size_in_bits(),
            MonotoneSequence::AllOnes(_) => 0,
        }
    }

    /// Serializes the discriminator tag and the full payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            MonotoneSequence::EliasFano(s) => {
                out.push(0);
                s.write_to(&mut out);
            }
            MonotoneSequence::RankedBitvector(s) => {
                out.push(1);
                s.write_to(&mut out);
            }
            MonotoneSequence::AllOnes(s) => {
                out.push(2);
                out.extend_from_slice(&s.universe.to_le_bytes());
            }
        }
        out
    }

    /// Deserializes a sequence written by [`Self::to_bytes`], returning it and
    /// the number of bytes consumed.
    pub fn from_bytes(bytes: &[u8]) -> (Self, usize) {
        let tag = bytes[0];
        match tag {
            0 => {
                let (s, n) = CompactEliasFano::read_from(&bytes[1..]);
                (MonotoneSequence::EliasFano(s), 1 + n)
            }
            1 => {
                let (s, n) = CompactRankedBitvector::read_from(&bytes[1..]);
                (MonotoneSequence::RankedBitvector(s), 1 + n)
            }
            2 => {
                let universe = u64::from_le_bytes(bytes[1..9].try_into().unwrap());
                (MonotoneSequence::AllOnes(AllOnesSequence { universe }), 9)
            }
            _ => panic!("unrecognised monotone-sequence discriminator byte {tag}"),
        }
    }
}

fn write_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn write_bitvector(out: &mut Vec<u8>, bv: &BitVector) {
    write_u64(out, bv.len() as u64);
    write_u64(out, bv.words().len() as u64);
    for &w in bv.words() {
        write_u64(out, w);
    }
}

fn read_bitvector(bytes: &[u8]) -> (BitVector, usize) {
    let size = read_u64(bytes, 0) as usize;
    let num_words = read_u64(bytes, 8) as usize;
    let mut words = Vec::with_capacity(num_words);
    let mut off = 16;
    for _ in 0..num_words {
        words.push(read_u64(bytes, off));
        off += 8;
    }
    (BitVector::from_words(words, size), off)
}

fn write_u64_vec(out: &mut Vec<u8>, values: &[u64]) {
    write_u64(out, values.len() as u64);
    for &v in values {
        write_u64(out, v);
    }
}

fn read_u64_vec(bytes: &[u8]) -> (Vec<u64>, usize) {
    let len = read_u64(bytes, 0) as usize;
    let mut values = Vec::with_capacity(len);
    let mut off = 8;
    for _ in 0..len {
        values.push(read_u64(bytes, off));
        off += 8;
    }
    (values, off)
}

/// Walks the high bitmap of a gapped unary encoding to find the 0-based `i`-th
/// set bit, using a table of absolute positions sampled every `rate` ones
/// (entry `k` holds the position of one-index `(k + 1) * rate - 1`).
fn nth_one_position(bv: &BitVector, samples: &[u64], rate: usize, i: usize) -> usize {
    if rate > 0 {
        let group = (i + 1) / rate;
        if group >= 1 {
            if let Some(&sample_pos) = samples.get(group - 1) {
                let covered_index = group * rate - 1;
                if covered_index == i {
                    return sample_pos as usize;
                }
                let remaining = (i - covered_index - 1) as u32;
                return bv.unary_enumerator(sample_pos as usize + 1).skip(remaining);
            }
        }
    }
    bv.unary_enumerator(0).skip(i as u32)
}

/// Compact Elias-Fano: low `lower_bits` bits packed per value, high bits as a
/// unary-coded gapped bitmap with sampled jump tables into it.
#[derive(Debug, Clone)]
pub struct CompactEliasFano {
    n: u64,
    universe: u64,
    lower_bits: u32,
    low: BitVector,
    high: BitVector,
    ef_log_sampling1: u8,
    pointers1: Vec<u64>,
}

impl CompactEliasFano {
    fn lower_bits_for(n: u64, universe: u64) -> u32 {
        if universe > n {
            msb(universe / n).unwrap_or(0)
        } else {
            0
        }
    }

    fn estimate_size_in_bits(n: u64, universe: u64, cfg: &IndexConfig) -> u64 {
        let lower_bits = Self::lower_bits_for(n, universe) as u64;
        let higher_bits_length = n + (universe >> lower_bits) + 2;
        let ptr_width = ceil_log2(higher_bits_length) as u64;
        let pointers0_len = (higher_bits_length - n) >> cfg.ef_log_sampling0;
        let pointers1_len = n >> cfg.ef_log_sampling1;
        pointers0_len * ptr_width + pointers1_len * ptr_width + higher_bits_length + n * lower_bits
    }

    fn build(values: &[u64], universe: u64, cfg: &IndexConfig) -> Self {
        let n = values.len() as u64;
        let lower_bits = Self::lower_bits_for(n, universe);
        let higher_bits_length = n + (universe >> lower_bits) + 2;

        let mut low = BitVectorBuilder::with_capacity(values.len() * lower_bits as usize);
        let mut high = BitVectorBuilder::with_capacity(higher_bits_length as usize);
        high.zero_extend(higher_bits_length as usize);

        let rate1 = 1usize << cfg.ef_log_sampling1;
        let mut pointers1 = Vec::new();
        for (i, &v) in values.iter().enumerate() {
            if lower_bits > 0 {
                low.append_bits(v & ((1u64 << lower_bits) - 1), lower_bits);
            }
            let high_pos = (v >> lower_bits) as usize + i + 1;
            high.set_bits(high_pos, 1, 1);
            if rate1 > 0 && (i + 1) % rate1 == 0 {
                pointers1.push(high_pos as u64);
            }
        }

        CompactEliasFano {
            n,
            universe,
            lower_bits,
            low: low.build(),
            high: high.build(),
            ef_log_sampling1: cfg.ef_log_sampling1,
            pointers1,
        }
    }

    fn get(&self, i: usize) -> u64 {
        let rate1 = 1usize << self.ef_log_sampling1;
        let pos = nth_one_position(&self.high, &self.pointers1, rate1, i);
        let high_part = (pos - i - 1) as u64;
        let low_part = if self.lower_bits > 0 {
            self.low.get_bits(i * self.lower_bits as usize, self.lower_bits)
        } else {
            0
        };
        (high_part << self.lower_bits) | low_part
    }

    fn next_geq(&self, lb: u64) -> Option<(usize, u64)> {
        if self.n == 0 || lb >= self.universe {
            return None;
        }
        let mut lo = 0usize;
        let mut hi = self.n as usize;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.get(mid) >= lb {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        if lo == self.n as usize {
            None
        } else {
            Some((lo, self.get(lo)))
        }
    }

    fn size_in_bits(&self) -> u64 {
        Self::estimate_size_in_bits(
            self.n,
            self.universe,
            &IndexConfig { ef_log_sampling1: self.ef_log_sampling1, ..IndexConfig::default() },
        )
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        write_u64(out, self.n);
        write_u64(out, self.universe);
        out.push(self.lower_bits as u8);
        out.push(self.ef_log_sampling1);
        write_bitvector(out, &self.low);
        write_bitvector(out, &self.high);
        write_u64_vec(out, &self.pointers1);
    }

    fn read_from(bytes: &[u8]) -> (Self, usize) {
        let n = read_u64(bytes, 0);
        let universe = read_u64(bytes, 8);
        let lower_bits = bytes[16] as u32;
        let ef_log_sampling1 = bytes[17];
        let mut off = 18;
        let (low, c1) = read_bitvector(&bytes[off..]);
        off += c1;
        let (high, c2) = read_bitvector(&bytes[off..]);
        off += c2;
        let (pointers1, c3) = read_u64_vec(&bytes[off..]);
        off += c3;
        (CompactEliasFano { n, universe, lower_bits, low, high, ef_log_sampling1, pointers1 }, off)
    }
}

/// Compact ranked bitvector: an explicit `U`-bit bitmap plus rank1 samples
/// (for `rank(pos)`) and position samples (for `move(i)`).
#[derive(Debug, Clone)]
pub struct CompactRankedBitvector {
    n: u64,
    universe: u64,
    bitmap: BitVector,
    rank1_samples: Vec<u64>,
    rank_sample_rate_words: usize,
    pointers1: Vec<u64>,
    pos_sample_rate: usize,
}

impl CompactRankedBitvector {
    fn estimate_size_in_bits(n: u64, universe: u64, cfg: &IndexConfig) -> u64 {
        let rank1_width = ceil_log2(n + 1) as u64;
        let pos1_width = ceil_log2(universe.max(1)) as u64;
        let rate_words = 1u64 << cfg.rb_log_rank1_sampling;
        let num_words = universe.div_ceil(64);
        let rank1_count = num_words / rate_words + 1;
        let pos1_count = n >> cfg.rb_log_sampling1;
        universe + rank1_count * rank1_width + pos1_count * pos1_width
    }

    fn build(values: &[u64], universe: u64, cfg: &IndexConfig) -> Self {
        let mut b = BitVectorBuilder::with_capacity(universe as usize);
        b.zero_extend(universe as usize);
        for &v in values {
            b.set_bits(v as usize, 1, 1);
        }
        let bitmap = b.build();

        let rate_words = 1usize << cfg.rb_log_rank1_sampling;
        let num_words = bitmap.words().len();
        let mut rank1_samples = Vec::new();
        let mut cumulative = 0u64;
        let mut w = 0;
        while w <= num_words {
            rank1_samples.push(cumulative);
            for word in bitmap.words().iter().skip(w).take(rate_words) {
                cumulative += word.count_ones() as u64;
            }
            w += rate_words;
        }

        let rate1 = 1usize << cfg.rb_log_sampling1;
        let mut pointers1 = Vec::new();
        for (i, &v) in values.iter().enumerate() {
            if rate1 > 0 && (i + 1) % rate1 == 0 {
                pointers1.push(v);
            }
        }

        CompactRankedBitvector {
            n: values.len() as u64,
            universe,
            bitmap,
            rank1_samples,
            rank_sample_rate_words: rate_words,
            pointers1,
            pos_sample_rate: rate1,
        }
    }

    fn rank(&self, pos: usize) -> usize {
        let word_idx = pos / 64;
        let sample_k = word_idx / self.rank_sample_rate_words;
        let mut count = self.rank1_samples.get(sample_k).copied().unwrap_or(0) as usize;
        let start_word = sample_k * self.rank_sample_rate_words;
        for word in self.bitmap.words()[start_word..word_idx].iter() {
            count += word.count_ones() as usize;
        }
        let bit = pos % 64;
        if bit > 0 {
            if let Some(&word) = self.bitmap.words().get(word_idx) {
                count += (word & ((1u64 << bit) - 1)).count_ones() as usize;
            }
        }
        count
    }

    fn get(&self, i: usize) -> u64 {
        nth_one_position(&self.bitmap, &self.pointers1, self.pos_sample_rate, i) as u64
    }

    fn next_geq(&self, lb: u64) -> Option<(usize, u64)> {
        if lb >= self.universe {
            return None;
        }
        let pos = self.bitmap.successor1(lb as usize)?;
        Some((self.rank(pos), pos as u64))
    }

    fn size_in_bits(&self) -> u64 {
        let cfg = IndexConfig {
            rb_log_rank1_sampling: self.rank_sample_rate_words.trailing_zeros() as u8,
            rb_log_sampling1: self.pos_sample_rate.trailing_zeros() as u8,
            ..IndexConfig::default()
        };
        Self::estimate_size_in_bits(self.n, self.universe, &cfg)
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        write_u64(out, self.n);
        write_u64(out, self.universe);
        write_bitvector(out, &self.bitmap);
        write_u64_vec(out, &self.rank1_samples);
        write_u64(out, self.rank_sample_rate_words as u64);
        write_u64_vec(out, &self.pointers1);
        write_u64(out, self.pos_sample_rate as u64);
    }

    fn read_from(bytes: &[u8]) -> (Self, usize) {
        let n = read_u64(bytes, 0);
        let universe = read_u64(bytes, 8);
        let mut off = 16;
        let (bitmap, c1) = read_bitvector(&bytes[off..]);
        off += c1;
        let (rank1_samples, c2) = read_u64_vec(&bytes[off..]);
        off += c2;
        let rank_sample_rate_words = read_u64(bytes, off) as usize;
        off += 8;
        let (pointers1, c3) = read_u64_vec(&bytes[off..]);
        off += c3;
        let pos_sample_rate = read_u64(bytes, off) as usize;
        off += 8;
        (
            CompactRankedBitvector {
                n,
                universe,
                bitmap,
                rank1_samples,
                rank_sample_rate_words,
                pointers1,
                pos_sample_rate,
            },
            off,
        )
    }
}

/// `n == universe`: every position holds a value, so nothing needs to be stored.
#[derive(Debug, Clone, Copy)]
pub struct AllOnesSequence {
    universe: u64,
}
