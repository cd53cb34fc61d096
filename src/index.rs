//! The block inverted index: a byte buffer plus a monotone sequence of
//! per-term endpoints into it, and the sequential builder that produces one
//! from a [`crate::collection::BinaryFreqCollection`].
//!
//! Grounded on `original_source/block_freq_index.hpp` for the index's shape
//! (`operator[](t)` via the endpoints sequence, `warmup`) and on
//! `rank-retrieve/src/persistence/segment.rs` for the header-then-payload
//! on-disk layout style.

use crate::collection::BinaryFreqCollection;
use crate::config::IndexConfig;
use crate::directory::IndexSource;
use crate::error::{BuilderError, IndexError};
use crate::postings::{encode_posting_list, BlockPostingCursor};
use crate::sequence::MonotoneSequence;

const TRAILER_LEN: usize = 15;
const HEADER_LEN: usize = 5 + 8 + 8;

/// Holds the bytes of a block-compressed index (owned, memory-mapped, or any
/// other [`IndexSource`]) and the endpoint sequence into its posting data.
pub struct BlockInvertedIndex<S> {
    source: S,
    config: IndexConfig,
    num_terms: u32,
    num_docs: u32,
    endpoints: MonotoneSequence,
    posting_data_offset: usize,
}

impl<S: IndexSource> BlockInvertedIndex<S> {
    /// Parses the header, global parameters, and endpoint sequence out of `source`.
    pub fn open(source: S) -> Result<Self, IndexError> {
        let bytes = source.bytes();
        if bytes.len() < HEADER_LEN + TRAILER_LEN {
            return Err(IndexError::MalformedHeader {
                field: "header".to_string(),
                detail: "buffer shorter than the fixed header + trailer".to_string(),
            });
        }
        let config = IndexConfig::from_bytes(bytes[0..5].try_into().unwrap());
        let num_terms = u64::from_le_bytes(bytes[5..13].try_into().unwrap()) as u32;
        let num_docs = u64::from_le_bytes(bytes[13..21].try_into().unwrap()) as u32;
        if bytes.len() < HEADER_LEN + 1 {
            return Err(IndexError::MalformedHeader {
                field: "endpoints".to_string(),
                detail: "buffer truncated before the endpoint sequence".to_string(),
            });
        }
        let (endpoints, consumed) = MonotoneSequence::from_bytes(&bytes[HEADER_LEN..]);
        if endpoints.len() != num_terms as usize + 1 {
            return Err(IndexError::MalformedHeader {
                field: "endpoints".to_string(),
                detail: format!(
                    "endpoint sequence has {} entries, expected T + 1 = {}",
                    endpoints.len(),
                    num_terms as usize + 1
                ),
            });
        }

        Ok(BlockInvertedIndex {
            source,
            config,
            num_terms,
            num_docs,
            endpoints,
            posting_data_offset: HEADER_LEN + consumed,
        })
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn num_terms(&self) -> u32 {
        self.num_terms
    }

    pub fn config(&self) -> IndexConfig {
        self.config
    }

    fn term_byte_range(&self, term_id: u32) -> Result<(usize, usize), IndexError> {
        if term_id >= self.num_terms {
            return Err(IndexError::TermOutOfRange { term_id, num_terms: self.num_terms });
        }
        let start = self.endpoints.get(term_id as usize) as usize;
        let end = self.endpoints.get(term_id as usize + 1) as usize;
        Ok((self.posting_data_offset + start, self.posting_data_offset + end))
    }

    /// Opens a forward cursor over term `term_id`'s posting list.
    pub fn cursor(&self, term_id: u32) -> Result<BlockPostingCursor<'_>, IndexError> {
        let (start, _end) = self.term_byte_range(term_id)?;
        let bytes = &self.source.bytes()[start..];
        Ok(BlockPostingCursor::new(bytes, term_id))
    }

    /// Touches every byte of a term's posting data to prefault its mapping.
    /// Advisory: has no observable effect besides subsequent-access latency.
    pub fn warmup(&self, term_id: u32) -> Result<(), IndexError> {
        let (start, end) = self.term_byte_range(term_id)?;
        let slice = &self.source.bytes()[start..end];
        let mut touched: u64 = 0;
        for &b in slice {
            touched = touched.wrapping_add(b as u64);
        }
        std::hint::black_box(touched);
        Ok(())
    }
}

/// Sequential builder: consumes a [`BinaryFreqCollection`] term-by-term and
/// emits a complete index byte buffer. Parallel, sharded construction is out
/// of scope for this core.
pub struct IndexBuilder;

impl IndexBuilder {
    pub fn build(coll: &BinaryFreqCollection, config: IndexConfig) -> Result<Vec<u8>, BuilderError> {
        let num_docs = coll.num_docs();
        let mut posting_bytes = Vec::new();
        let mut endpoints: Vec<u64> = vec![0];
        let mut num_terms: u32 = 0;

        for item in coll.terms() {
            let (term_id, docs, freqs) = item?;
            let encoded = encode_posting_list(&docs, &freqs, num_docs);
            posting_bytes.extend_from_slice(&encoded);
            endpoints.push(posting_bytes.len() as u64);
            num_terms += 1;
        }

        let universe = posting_bytes.len() as u64 + 1;
        let endpoints_seq = MonotoneSequence::build(&endpoints, universe, &config);

        let mut out = Vec::with_capacity(HEADER_LEN + posting_bytes.len() + TRAILER_LEN);
        out.extend_from_slice(&config.to_bytes());
        out.extend_from_slice(&(num_terms as u64).to_le_bytes());
        out.extend_from_slice(&(num_docs as u64).to_le_bytes());
        out.extend_from_slice(&endpoints_seq.to_bytes());
        out.extend_from_slice(&posting_bytes);
        out.extend_from_slice(&[0u8; TRAILER_LEN]);
        Ok(out)
    }
}
