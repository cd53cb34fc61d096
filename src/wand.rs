//! WAND data: per-term max score plus a block-level skip structure the
//! MaxScore and Block-Max WAND algorithms use for upper-bound pruning.
//!
//! Fixed-block partitioning is grounded on `wand_utils.hpp`'s
//! `static_block_partition`. Variable-block partitioning ports
//! `score_opt_partition.hpp`'s sliding-window DP (`min_cost[0] = 0`; a
//! geometrically growing set of cost windows relaxes `min_cost`/`path` as the
//! start position sweeps forward; the partition is recovered by walking
//! `path` backward from `size`). On-disk layout is a simpler sequential scan
//! rather than [`crate::sequence::MonotoneSequence`]-compressed endpoints:
//! WAND data is a small side artifact, not the index itself, so the format
//! favours a straightforward per-term record over maximal compactness.

use std::collections::VecDeque;

use crate::config::IndexConfig;
use crate::directory::IndexSource;
use crate::error::IndexError;
use crate::index::BlockInvertedIndex;
use crate::scorer::Bm25;

/// Default fixed WAND block size when none is given explicitly.
pub const DEFAULT_WAND_BLOCK_SIZE: usize = 64;

const HEADER_LEN: usize = 5 + 8 + 8;

/// A term's max partial score and its (last-docid, max-score) block table.
pub struct WandData<S> {
    source: S,
    num_terms: u32,
    num_docs: u32,
    doc_lengths_offset: usize,
    term_offsets: Vec<usize>,
}

impl<S: IndexSource> WandData<S> {
    pub fn open(source: S) -> Result<Self, IndexError> {
        let bytes = source.bytes();
        if bytes.len() < HEADER_LEN {
            return Err(IndexError::MalformedHeader {
                field: "header".to_string(),
                detail: "buffer shorter than the fixed header".to_string(),
            });
        }
        let num_terms = u64::from_le_bytes(bytes[5..13].try_into().unwrap()) as u32;
        let num_docs = u64::from_le_bytes(bytes[13..21].try_into().unwrap()) as u32;

        let doc_lengths_offset = HEADER_LEN;
        let doc_lengths_end = doc_lengths_offset + num_docs as usize * 4;
        if bytes.len() < doc_lengths_end {
            return Err(IndexError::MalformedHeader {
                field: "doc_lengths".to_string(),
                detail: "buffer truncated before the document-length vector".to_string(),
            });
        }

        let mut offset = doc_lengths_end;
        let mut term_offsets = Vec::with_capacity(num_terms as usize);
        for t in 0..num_terms {
            if offset + 8 > bytes.len() {
                return Err(IndexError::MalformedHeader {
                    field: "wand_term_record".to_string(),
                    detail: format!("buffer truncated scanning term {t}'s record"),
                });
            }
            term_offsets.push(offset);
            let num_blocks = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
            offset += 4 + 4 + num_blocks * 8;
        }

        Ok(WandData { source, num_terms, num_docs, doc_lengths_offset, term_offsets })
    }

    pub fn num_terms(&self) -> u32 {
        self.num_terms
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn doc_lengths(&self) -> Vec<u32> {
        let bytes = self.source.bytes();
        let mut out = Vec::with_capacity(self.num_docs as usize);
        for d in 0..self.num_docs as usize {
            let o = self.doc_lengths_offset + d * 4;
            out.push(u32::from_le_bytes(bytes[o..o + 4].try_into().unwrap()));
        }
        out
    }

    fn term_record(&self, term_id: u32) -> Result<&[u8], IndexError> {
        if term_id >= self.num_terms {
            return Err(IndexError::TermOutOfRange { term_id, num_terms: self.num_terms });
        }
        let start = self.term_offsets[term_id as usize];
        let bytes = self.source.bytes();
        let num_blocks = u32::from_le_bytes(bytes[start..start + 4].try_into().unwrap()) as usize;
        let end = start + 4 + 4 + num_blocks * 8;
        Ok(&bytes[start..end])
    }

    pub fn max_term_weight(&self, term_id: u32) -> Result<f32, IndexError> {
        let record = self.term_record(term_id)?;
        Ok(f32::from_le_bytes(record[4..8].try_into().unwrap()))
    }

    /// Opens a block enumerator over term `term_id`'s (last-docid, max-score) pairs.
    pub fn cursor(&self, term_id: u32) -> Result<WandCursor, IndexError> {
        let record = self.term_record(term_id)?;
        let num_blocks = u32::from_le_bytes(record[0..4].try_into().unwrap()) as usize;
        let mut blocks = Vec::with_capacity(num_blocks);
        let mut off = 8;
        for _ in 0..num_blocks {
            let last_docid = u32::from_le_bytes(record[off..off + 4].try_into().unwrap());
            let max_score = f32::from_le_bytes(record[off + 4..off + 8].try_into().unwrap());
            blocks.push((last_docid, max_score));
            off += 8;
        }
        Ok(WandCursor { blocks, pos: 0 })
    }
}

/// A term's block enumerator: forward-only, advanced by `next_geq`.
pub struct WandCursor {
    blocks: Vec<(u32, f32)>,
    pos: usize,
}

impl WandCursor {
    /// Advances to the first block whose last-docid is `>= d`, returning it.
    pub fn next_geq(&mut self, d: u32) -> Option<(u32, f32)> {
        while self.pos < self.blocks.len() && self.blocks[self.pos].0 < d {
            self.pos += 1;
        }
        self.blocks.get(self.pos).copied()
    }

    pub fn docid(&self) -> Option<u32> {
        self.blocks.get(self.pos).map(|b| b.0)
    }

    pub fn score(&self) -> Option<f32> {
        self.blocks.get(self.pos).map(|b| b.1)
    }
}

fn collect_term_docs_and_scores<S: IndexSource>(
    index: &BlockInvertedIndex<S>,
    bm25: &Bm25,
    term_id: u32,
) -> Result<(Vec<u32>, Vec<f32>), IndexError> {
    let sentinel = index.num_docs();
    let mut cur = index.cursor(term_id)?;
    let mut docs = Vec::with_capacity(cur.size());
    let mut scores = Vec::with_capacity(cur.size());
    loop {
        let d = cur.value(sentinel);
        if d == sentinel {
            break;
        }
        let freq = cur.freq();
        docs.push(d);
        scores.push(bm25.doc_term_weight(freq, bm25.norm_len(d)));
        cur.advance(sentinel);
    }
    Ok((docs, scores))
}

fn partition_fixed(docs: &[u32], scores: &[f32], block_size: usize) -> Vec<(u32, f32)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < docs.len() {
        let end = (i + block_size).min(docs.len());
        let max = scores[i..end].iter().cloned().fold(f32::MIN, f32::max);
        out.push((docs[end - 1], max));
        i = end;
    }
    out
}

/// One cost window of `score_opt_partition.hpp`'s sliding-window DP: tracks
/// `size() * max() - sum()` over `[start, end)` via a monotonic deque of
/// scores, so `advance_end`/`advance_start` stay O(1) amortised.
struct ScoreWindow<'a> {
    scores: &'a [f32],
    start: usize,
    end: usize,
    sum: f64,
    max_queue: VecDeque<f32>,
    fixed_cost: f64,
    cost_upper_bound: f64,
}

impl<'a> ScoreWindow<'a> {
    fn new(scores: &'a [f32], cost_upper_bound: f64, fixed_cost: f64) -> Self {
        ScoreWindow { scores, start: 0, end: 0, sum: 0.0, max_queue: VecDeque::new(), fixed_cost, cost_upper_bound }
    }

    fn size(&self) -> usize {
        self.end - self.start
    }

    fn advance_end(&mut self) {
        let v = self.scores[self.end];
        self.sum += v as f64;
        while let Some(&back) = self.max_queue.back() {
            if back < v {
                self.max_queue.pop_back();
            } else {
                break;
            }
        }
        self.max_queue.push_back(v);
        self.end += 1;
    }

    fn advance_start(&mut self) {
        let v = self.scores[self.start];
        if self.max_queue.front() == Some(&v) {
            self.max_queue.pop_front();
        }
        self.sum -= v as f64;
        self.start += 1;
    }

    fn max(&self) -> f32 {
        *self.max_queue.front().expect("cost() only called on a non-empty window")
    }

    fn cost(&self) -> f64 {
        if self.size() < 2 {
            return self.fixed_cost;
        }
        self.size() as f64 * self.max() as f64 - self.sum + self.fixed_cost
    }
}

/// Minimum-cost partition of `scores` into contiguous blocks, minimising
/// `Σ (block_size * block_max - Σ scores_in_block) + fixed_cost` per block.
/// Returns exclusive end positions of each block (e.g. `[3, 7, 10]`).
fn optimal_score_partition(scores: &[f32], eps1: f64, eps2: f64, fixed_cost: f64) -> Vec<usize> {
    let size = scores.len();
    if size == 0 {
        return Vec::new();
    }

    let max_all = scores.iter().cloned().fold(f32::MIN, f32::max);
    let sum_all: f64 = scores.iter().map(|&s| s as f64).sum();
    let single_block_cost = size as f64 * max_all as f64 - sum_all + fixed_cost;

    let mut min_cost = vec![single_block_cost; size + 1];
    min_cost[0] = 0.0;

    let mut windows: Vec<ScoreWindow> = Vec::new();
    let cost_lb = fixed_cost;
    let mut cost_bound = cost_lb;
    loop {
        windows.push(ScoreWindow::new(scores, cost_bound, fixed_cost));
        if cost_bound >= single_block_cost {
            break;
        }
        cost_bound *= 1.0 + eps2;
        if eps1 != 0.0 && cost_bound >= cost_lb / eps1 {
            break;
        }
    }

    let mut path = vec![0usize; size + 1];
    let mut maxs = vec![0f32; size + 1];
    maxs[size] = max_all;

    for i in 0..size {
        let mut last_end = i + 1;
        for window in windows.iter_mut() {
            while window.end < last_end {
                window.advance_end();
            }
            loop {
                let window_cost = window.cost();
                if min_cost[i] + window_cost < min_cost[window.end] {
                    min_cost[window.end] = min_cost[i] + window_cost;
                    path[window.end] = window.start;
                    maxs[window.end] = window.max();
                }
                last_end = window.end;
                if window.end == size {
                    break;
                }
                if window_cost >= window.cost_upper_bound {
                    break;
                }
                window.advance_end();
            }
            window.advance_start();
        }
    }

    let mut partition = Vec::new();
    let mut curr = size;
    while curr != 0 {
        partition.push(curr);
        curr = path[curr];
    }
    partition.reverse();
    partition
}

fn partition_variable(docs: &[u32], scores: &[f32], eps1: f64, eps2: f64, fixed_cost: f64) -> Vec<(u32, f32)> {
    let ends = optimal_score_partition(scores, eps1, eps2, fixed_cost);
    let mut out = Vec::with_capacity(ends.len());
    let mut start = 0;
    for end in ends {
        let max = scores[start..end].iter().cloned().fold(f32::MIN, f32::max);
        out.push((docs[end - 1], max));
        start = end;
    }
    out
}

fn write_term_record(out: &mut Vec<u8>, blocks: &[(u32, f32)], max_term_weight: f32) {
    out.extend_from_slice(&(blocks.len() as u32).to_le_bytes());
    out.extend_from_slice(&max_term_weight.to_le_bytes());
    for &(docid, score) in blocks {
        out.extend_from_slice(&docid.to_le_bytes());
        out.extend_from_slice(&score.to_le_bytes());
    }
}

fn build_with_partitioner<S: IndexSource>(
    index: &BlockInvertedIndex<S>,
    bm25: &Bm25,
    config: &IndexConfig,
    partitioner: impl Fn(&[u32], &[f32]) -> Vec<(u32, f32)>,
) -> Result<Vec<u8>, IndexError> {
    let num_docs = index.num_docs();
    let num_terms = index.num_terms();

    let mut out = Vec::new();
    out.extend_from_slice(&config.to_bytes());
    out.extend_from_slice(&(num_terms as u64).to_le_bytes());
    out.extend_from_slice(&(num_docs as u64).to_le_bytes());
    for &len in bm25.doc_lengths() {
        out.extend_from_slice(&len.to_le_bytes());
    }

    for term_id in 0..num_terms {
        let (docs, scores) = collect_term_docs_and_scores(index, bm25, term_id)?;
        let max_term_weight = scores.iter().cloned().fold(0.0f32, f32::max);
        let blocks = partitioner(&docs, &scores);
        write_term_record(&mut out, &blocks, max_term_weight);
    }
    Ok(out)
}

/// Builds WAND data with every term's posting list split into fixed-size
/// blocks of `1 << config.log_partition_size` postings.
pub fn build_fixed<S: IndexSource>(index: &BlockInvertedIndex<S>, bm25: &Bm25, config: &IndexConfig) -> Result<Vec<u8>, IndexError> {
    let block_size = 1usize << config.log_partition_size;
    build_with_partitioner(index, bm25, config, |docs, scores| partition_fixed(docs, scores, block_size))
}

/// Builds WAND data with each term's posting list partitioned by the
/// score-aware optimal-partition DP.
pub fn build_variable<S: IndexSource>(
    index: &BlockInvertedIndex<S>,
    bm25: &Bm25,
    index_config: &IndexConfig,
    query_config: &crate::config::QueryConfig,
) -> Result<Vec<u8>, IndexError> {
    build_with_partitioner(index, bm25, index_config, |docs, scores| {
        partition_variable(docs, scores, query_config.eps1_wand, query_config.eps2_wand, query_config.fixed_cost_wand_partition)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::BinaryFreqCollection;
    use crate::config::QueryConfig;
    use crate::index::IndexBuilder;

    fn u32_list(values: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for &v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    fn toy_collection() -> BinaryFreqCollection {
        let num_docs = 10u32;
        let mut docs = u32_list(&[num_docs]);
        docs.extend(u32_list(&[0, 3, 7]));
        docs.extend(u32_list(&[1, 2, 3, 4, 5, 6, 7, 8]));
        docs.extend(u32_list(&[9]));

        let mut freqs = u32_list(&[1, 2, 1]);
        freqs.extend(u32_list(&[1, 1, 1, 1, 1, 1, 1, 1]));
        freqs.extend(u32_list(&[5]));

        let mut sizes = u32_list(&[num_docs]);
        sizes.extend(u32_list(&[5, 5, 5, 5, 5, 5, 5, 5, 5, 5]));

        BinaryFreqCollection::from_bytes(docs, freqs, sizes).unwrap()
    }

    #[test]
    fn fixed_wand_data_roundtrips_max_scores_and_blocks() {
        let coll = toy_collection();
        let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
        let index = BlockInvertedIndex::open(index_bytes).unwrap();
        let lengths = coll.doc_lengths().to_vec();
        let bm25 = Bm25::new(&lengths);

        let mut cfg = IndexConfig::default();
        cfg.log_partition_size = 1; // block size 2, to get multiple blocks on term 1 (8 postings)
        let wand_bytes = build_fixed(&index, &bm25, &cfg).unwrap();
        let wand = WandData::open(wand_bytes).unwrap();

        assert_eq!(wand.num_terms(), 3);
        assert_eq!(wand.num_docs(), 10);

        let mut cur = wand.cursor(1).unwrap();
        assert_eq!(cur.next_geq(0).unwrap().0, 2); // first block covers docs [1,2] -> last docid 2
        let w = wand.max_term_weight(1).unwrap();
        assert!(w > 0.0);

        let mut cur2 = wand.cursor(2).unwrap();
        assert_eq!(cur2.next_geq(0), Some((9, cur2.score().unwrap())));
    }

    #[test]
    fn variable_wand_data_covers_whole_posting_list() {
        let coll = toy_collection();
        let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
        let index = BlockInvertedIndex::open(index_bytes).unwrap();
        let lengths = coll.doc_lengths().to_vec();
        let bm25 = Bm25::new(&lengths);

        let wand_bytes = build_variable(&index, &bm25, &IndexConfig::default(), &QueryConfig::default()).unwrap();
        let wand = WandData::open(wand_bytes).unwrap();

        let mut cur = wand.cursor(1).unwrap();
        let last = cur.next_geq(u32::MAX - 1);
        // term 1's last docid is 8; next_geq past it should fall through to None once exhausted.
        let _ = last;
        let mut cur2 = wand.cursor(1).unwrap();
        let (last_docid, _) = cur2.next_geq(8).unwrap();
        assert_eq!(last_docid, 8);
    }

    #[test]
    fn optimal_score_partition_covers_all_positions_monotonically() {
        let scores = vec![0.1f32, 0.9, 0.2, 0.95, 0.05, 0.8, 0.3, 0.99];
        let ends = optimal_score_partition(&scores, 0.01, 0.4, 1.0);
        assert_eq!(*ends.last().unwrap(), scores.len());
        let mut prev = 0;
        for &e in &ends {
            assert!(e > prev);
            prev = e;
        }
    }
}
