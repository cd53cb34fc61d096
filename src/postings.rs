//! Block posting lists: the per-term byte layout (length header, block-max
//! skip table, block byte-endpoints, concatenated encoded blocks) and the
//! cursor that decodes it one block at a time.
//!
//! Grounded on `original_source/block_posting_list.hpp`: the `base`/gap-minus-one
//! encoding (`docs_buf[0] = base + raw[0]`, `docs_buf[k] = docs_buf[k-1] + raw[k] + 1`),
//! the per-block universe derived from neighbouring block maxima, and lazy
//! frequency-block decoding.

use crate::codec::block::{BitpackedBlockCodec, BlockCodec, BLOCK_SIZE};
use crate::codec::tvb;
use crate::profile;

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

fn read_u32_le(bytes: &[u8], idx: usize) -> u32 {
    let o = idx * 4;
    u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]])
}

fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Encodes a single term's posting list: `n` strictly increasing docids below
/// `universe` and their matching frequencies (`>= 1`).
pub fn encode_posting_list(docs: &[u32], freqs: &[u32], universe: u32) -> Vec<u8> {
    assert_eq!(docs.len(), freqs.len());
    assert!(!docs.is_empty(), "posting list must be non-empty");
    assert!(docs.windows(2).all(|w| w[0] < w[1]), "docids must be strictly increasing");

    let n = docs.len();
    let num_blocks = ceil_div(n, BLOCK_SIZE);

    let mut block_maxs = Vec::with_capacity(num_blocks);
    for b in 0..num_blocks {
        let end = ((b + 1) * BLOCK_SIZE).min(n);
        block_maxs.push(docs[end - 1]);
    }

    let mut block_data = Vec::new();
    let mut block_endpoints = Vec::with_capacity(num_blocks.saturating_sub(1));

    for b in 0..num_blocks {
        let start = b * BLOCK_SIZE;
        let end = (start + BLOCK_SIZE).min(n);
        let count = end - start;
        let base: u32 = if b == 0 { 0 } else { block_maxs[b - 1] + 1 };

        let mut gap_values = Vec::with_capacity(count);
        gap_values.push(docs[start] - base);
        for k in (start + 1)..end {
            gap_values.push(docs[k] - docs[k - 1] - 1);
        }
        let doc_universe = block_maxs[b] - base - (count as u32 - 1);

        BitpackedBlockCodec::encode(&gap_values, doc_universe, count, &mut block_data);

        let freq_values: Vec<u32> = freqs[start..end].iter().map(|&f| f - 1).collect();
        BitpackedBlockCodec::encode(&freq_values, u32::MAX, count, &mut block_data);

        if b + 1 < num_blocks {
            // offset, relative to the start of the block-data region, where block b+1 begins
            block_endpoints.push(block_data.len() as u32);
        }
    }

    let mut out = Vec::new();
    tvb::encode(n as u64, &mut out);
    for &m in &block_maxs {
        write_u32_le(&mut out, m);
    }
    for &e in &block_endpoints {
        write_u32_le(&mut out, e);
    }
    out.extend_from_slice(&block_data);
    out
}

/// Decodes one block's doc-gaps and (lazily) frequencies.
struct BlockScratch {
    docs: [u32; BLOCK_SIZE],
    freqs: [u32; BLOCK_SIZE],
    freqs_decoded: bool,
    freq_byte_offset: usize,
    size: usize,
}

impl Default for BlockScratch {
    fn default() -> Self {
        BlockScratch { docs: [0; BLOCK_SIZE], freqs: [0; BLOCK_SIZE], freqs_decoded: false, freq_byte_offset: 0, size: 0 }
    }
}

/// Forward cursor over a single term's block posting list.
pub struct BlockPostingCursor<'a> {
    block_data: &'a [u8],
    block_maxs_bytes: &'a [u8],
    block_endpoints_bytes: &'a [u8],
    n: usize,
    num_blocks: usize,
    term_id: u32,
    cur_block: usize,
    pos_in_block: usize,
    scratch: BlockScratch,
    done: bool,
}

impl<'a> BlockPostingCursor<'a> {
    /// Builds a cursor over `bytes`, which must start at a term's length header
    /// and extend at least to the end of its encoded blocks (plus safe
    /// overread padding).
    pub fn new(bytes: &'a [u8], term_id: u32) -> Self {
        let (n64, consumed) = tvb::decode(bytes);
        let n = n64 as usize;
        let num_blocks = ceil_div(n, BLOCK_SIZE);
        let endpoints_count = num_blocks.saturating_sub(1);

        let maxs_start = consumed;
        let maxs_end = maxs_start + 4 * num_blocks;
        let endpoints_end = maxs_end + 4 * endpoints_count;

        let mut cursor = BlockPostingCursor {
            block_data: &bytes[endpoints_end..],
            block_maxs_bytes: &bytes[maxs_start..maxs_end],
            block_endpoints_bytes: &bytes[maxs_end..endpoints_end],
            n,
            num_blocks,
            term_id,
            cur_block: 0,
            pos_in_block: 0,
            scratch: BlockScratch::default(),
            done: n == 0,
        };
        if n > 0 {
            cursor.decode_block(0);
        }
        cursor
    }

    fn block_max(&self, b: usize) -> u32 {
        read_u32_le(self.block_maxs_bytes, b)
    }

    fn block_byte_start(&self, b: usize) -> usize {
        if b == 0 {
            0
        } else {
            read_u32_le(self.block_endpoints_bytes, b - 1) as usize
        }
    }

    fn block_count(&self, b: usize) -> usize {
        let start = b * BLOCK_SIZE;
        ((start + BLOCK_SIZE).min(self.n)) - start
    }

    fn decode_block(&mut self, b: usize) {
        let count = self.block_count(b);
        let base: u32 = if b == 0 { 0 } else { self.block_max(b - 1) + 1 };
        let byte_start = self.block_byte_start(b);
        let data = &self.block_data[byte_start..];

        let mut raw = [0u32; BLOCK_SIZE];
        let consumed = BitpackedBlockCodec::decode(data, &mut raw, u32::MAX, count);

        self.scratch.docs[0] = base + raw[0];
        for k in 1..count {
            self.scratch.docs[k] = self.scratch.docs[k - 1] + raw[k] + 1;
        }
        self.scratch.freq_byte_offset = byte_start + consumed;
        self.scratch.freqs_decoded = false;
        self.scratch.size = count;
        self.cur_block = b;
        self.pos_in_block = 0;
        profile::record_block_decoded(self.term_id);
    }

    fn ensure_freqs_decoded(&mut self) {
        if self.scratch.freqs_decoded {
            return;
        }
        let count = self.scratch.size;
        let data = &self.block_data[self.scratch.freq_byte_offset..];
        BitpackedBlockCodec::decode(data, &mut self.scratch.freqs, u32::MAX, count);
        self.scratch.freqs_decoded = true;
        profile::record_freqs_decoded(self.term_id);
    }

    /// Current docid, or `N` (the sentinel) once past the last posting. The
    /// caller supplies `sentinel` (the collection's document count) since the
    /// cursor itself does not retain it.
    pub fn value(&self, sentinel: u32) -> u32 {
        if self.done {
            sentinel
        } else {
            self.scratch.docs[self.pos_in_block]
        }
    }

    pub fn freq(&mut self) -> u32 {
        self.ensure_freqs_decoded();
        self.scratch.freqs[self.pos_in_block] + 1
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Steps to the next posting; clamps to the sentinel once exhausted.
    pub fn advance(&mut self, sentinel: u32) -> u32 {
        self.pos_in_block += 1;
        if self.pos_in_block == self.scratch.size {
            if self.cur_block + 1 == self.num_blocks {
                self.done = true;
                return sentinel;
            }
            self.decode_block(self.cur_block + 1);
        }
        self.value(sentinel)
    }

    /// Advances to the first posting with docid `>= lb`, clamping to the
    /// sentinel if none exists.
    pub fn advance_to_geq(&mut self, lb: u32, sentinel: u32) -> u32 {
        if self.done {
            return sentinel;
        }
        if self.value(sentinel) >= lb {
            return self.value(sentinel);
        }
        if lb > self.block_max(self.cur_block) {
            let mut b = self.cur_block + 1;
            while b < self.num_blocks && self.block_max(b) < lb {
                b += 1;
            }
            if b == self.num_blocks {
                self.done = true;
                return sentinel;
            }
            self.decode_block(b);
        }
        while self.scratch.docs[self.pos_in_block] < lb {
            self.pos_in_block += 1;
        }
        self.value(sentinel)
    }

    /// Seeks to the `p`-th posting (0-based, across the whole list).
    pub fn advance_to_position(&mut self, p: usize) {
        debug_assert!(p < self.n);
        let target_block = p / BLOCK_SIZE;
        if target_block != self.cur_block {
            self.decode_block(target_block);
        }
        self.pos_in_block = p - target_block * BLOCK_SIZE;
        self.done = false;
    }
}
