//! The three disjunctive top-k retrieval algorithms: exhaustive TAAT,
//! MaxScore, and Block-Max WAND. On identical inputs all three return the
//! same `(score, docid)` set, modulo quantization.
//!
//! MaxScore is grounded on `v1/maxscore.hpp`'s `MaxScoreJoin` (ascending sort
//! by max contribution, prefix-sum upper bounds, non-essential cursors
//! skipped via `advance_to_geq` with branch-and-bound on the partial score).
//! Block-Max WAND is ported from `block_max_wand_lb_query.hpp`: pivot
//! selection extends past every cursor tied on the pivot docid before the
//! block upper bound is summed, and the bubble-right restore below mirrors
//! that file's bubble-down loops for re-sorting cursors by docid after an
//! advance.

use crate::directory::IndexSource;
use crate::error::IndexError;
use crate::index::BlockInvertedIndex;
use crate::postings::BlockPostingCursor;
use crate::scorer::Bm25;
use crate::topk::TopKQueue;
use crate::wand::{WandCursor, WandData};

/// Reusable scratch space for [`query_taat`]: an `N`-long accumulator, so
/// repeated queries against the same index do not reallocate it.
pub struct QueryScratch {
    accumulator: Vec<f32>,
}

impl QueryScratch {
    pub fn new(num_docs: usize) -> Self {
        QueryScratch { accumulator: vec![0.0; num_docs] }
    }

    fn ensure_reset(&mut self, num_docs: usize) {
        if self.accumulator.len() != num_docs {
            self.accumulator = vec![0.0; num_docs];
        } else {
            self.accumulator.iter_mut().for_each(|v| *v = 0.0);
        }
    }
}

/// Exhaustive score-at-a-time accumulator sweep: every posting of every
/// query term is visited once, accumulated into a dense per-document array.
pub fn query_taat<S: IndexSource>(
    index: &BlockInvertedIndex<S>,
    bm25: &Bm25,
    query: &[(u32, f32)],
    k: usize,
    scratch: &mut QueryScratch,
) -> Result<Vec<(f32, u32)>, IndexError> {
    let num_docs = index.num_docs() as usize;
    scratch.ensure_reset(num_docs);
    let sentinel = index.num_docs();

    for &(term_id, query_weight) in query {
        let mut cursor = index.cursor(term_id)?;
        loop {
            let d = cursor.value(sentinel);
            if d == sentinel {
                break;
            }
            let freq = cursor.freq();
            scratch.accumulator[d as usize] += query_weight * bm25.doc_term_weight(freq, bm25.norm_len(d));
            cursor.advance(sentinel);
        }
    }

    let mut topk = TopKQueue::new(k);
    for d in 0..num_docs {
        topk.insert(scratch.accumulator[d], d as u32);
    }
    Ok(topk.finalize())
}

struct MaxscoreCursor<'a> {
    cursor: BlockPostingCursor<'a>,
    query_weight: f32,
    max_contrib: f32,
}

/// Document-at-a-time MaxScore: cursors sorted ascending by their maximum
/// possible contribution; a prefix of weak ("non-essential") cursors is
/// looked up lazily while a suffix of strong ("essential") cursors is walked
/// unconditionally.
pub fn query_maxscore<S: IndexSource>(
    index: &BlockInvertedIndex<S>,
    wand: &WandData<S>,
    bm25: &Bm25,
    query: &[(u32, f32)],
    k: usize,
) -> Result<Vec<(f32, u32)>, IndexError> {
    let sentinel = index.num_docs();
    let mut cursors: Vec<MaxscoreCursor> = Vec::with_capacity(query.len());
    for &(term_id, query_weight) in query {
        let cursor = index.cursor(term_id)?;
        let max_w = wand.max_term_weight(term_id)?;
        cursors.push(MaxscoreCursor { cursor, query_weight, max_contrib: query_weight * max_w });
    }

    let mut topk = TopKQueue::new(k);
    if cursors.is_empty() {
        return Ok(topk.finalize());
    }

    cursors.sort_by(|a, b| a.max_contrib.partial_cmp(&b.max_contrib).unwrap());
    let m = cursors.len();
    let mut upper_bounds = vec![0f32; m];
    upper_bounds[0] = cursors[0].max_contrib;
    for i in 1..m {
        upper_bounds[i] = upper_bounds[i - 1] + cursors[i].max_contrib;
    }

    let mut non_essential_count = 0usize;
    let mut current_docid = cursors.iter().map(|c| c.cursor.value(sentinel)).min().unwrap();

    while non_essential_count < m && current_docid < sentinel {
        let mut score = 0f32;
        let mut next_docid = sentinel;

        for pos in non_essential_count..m {
            let c = &mut cursors[pos];
            if c.cursor.value(sentinel) == current_docid {
                let freq = c.cursor.freq();
                score += c.query_weight * bm25.doc_term_weight(freq, bm25.norm_len(current_docid));
                c.cursor.advance(sentinel);
            }
            let v = c.cursor.value(sentinel);
            if v < next_docid {
                next_docid = v;
            }
        }

        let mut resolved = true;
        for pos in (0..non_essential_count).rev() {
            if !topk.would_enter(score + upper_bounds[pos]) {
                resolved = false;
                break;
            }
            let c = &mut cursors[pos];
            let found = c.cursor.advance_to_geq(current_docid, sentinel);
            if found == current_docid {
                let freq = c.cursor.freq();
                score += c.query_weight * bm25.doc_term_weight(freq, bm25.norm_len(current_docid));
            }
        }

        if resolved {
            topk.insert(score, current_docid);
            while non_essential_count < m && !topk.would_enter(upper_bounds[non_essential_count]) {
                non_essential_count += 1;
            }
        }
        current_docid = next_docid;
    }

    Ok(topk.finalize())
}

struct BmwCursor<'a> {
    cursor: BlockPostingCursor<'a>,
    wand_cursor: WandCursor,
    query_weight: f32,
    max_contrib: f32,
}

fn bubble_right(cursors: &mut [BmwCursor], mut idx: usize, sentinel: u32) {
    while idx + 1 < cursors.len() && cursors[idx].cursor.value(sentinel) > cursors[idx + 1].cursor.value(sentinel) {
        cursors.swap(idx, idx + 1);
        idx += 1;
    }
}

/// Document-at-a-time Block-Max WAND: cursors kept sorted by current docid;
/// a pivot document is chosen from the running term-level upper bound, then
/// confirmed or refined against block-level (WAND) upper bounds before
/// being fully scored.
pub fn query_bmw<S: IndexSource>(
    index: &BlockInvertedIndex<S>,
    wand: &WandData<S>,
    bm25: &Bm25,
    query: &[(u32, f32)],
    k: usize,
) -> Result<Vec<(f32, u32)>, IndexError> {
    let sentinel = index.num_docs();
    let mut cursors: Vec<BmwCursor> = Vec::with_capacity(query.len());
    for &(term_id, query_weight) in query {
        let cursor = index.cursor(term_id)?;
        let wand_cursor = wand.cursor(term_id)?;
        let max_w = wand.max_term_weight(term_id)?;
        cursors.push(BmwCursor { cursor, wand_cursor, query_weight, max_contrib: query_weight * max_w });
    }

    let mut topk = TopKQueue::new(k);
    if cursors.is_empty() {
        return Ok(topk.finalize());
    }

    cursors.sort_by_key(|c| c.cursor.value(sentinel));
    let n = cursors.len();

    loop {
        let mut cumulative = 0f32;
        let mut pivot = None;
        for i in 0..n {
            if cursors[i].cursor.value(sentinel) == sentinel {
                break;
            }
            cumulative += cursors[i].max_contrib;
            if cumulative > topk.threshold() {
                pivot = Some(i);
                break;
            }
        }
        let mut p = match pivot {
            Some(p) => p,
            None => break,
        };
        let d = cursors[p].cursor.value(sentinel);
        while p + 1 < n && cursors[p + 1].cursor.value(sentinel) == d {
            p += 1;
        }

        let mut bmub = 0f32;
        for cur in cursors.iter_mut().take(p + 1) {
            if let Some((_last_docid, max_score)) = cur.wand_cursor.next_geq(d) {
                bmub += max_score * cur.query_weight;
            }
        }

        if bmub <= topk.threshold() {
            let block_barrier = (0..=p).map(|i| cursors[i].wand_cursor.docid().unwrap_or(sentinel.saturating_sub(1))).min().unwrap();
            let target = block_barrier.saturating_add(1);
            let advance_idx =
                (0..=p).max_by(|&a, &b| cursors[a].max_contrib.partial_cmp(&cursors[b].max_contrib).unwrap()).unwrap();
            cursors[advance_idx].cursor.advance_to_geq(target, sentinel);
            bubble_right(&mut cursors, advance_idx, sentinel);
            continue;
        }

        if cursors[0].cursor.value(sentinel) == d {
            let mut score = 0f32;
            for c in cursors.iter_mut() {
                if c.cursor.value(sentinel) == d {
                    let freq = c.cursor.freq();
                    score += c.query_weight * bm25.doc_term_weight(freq, bm25.norm_len(d));
                    c.cursor.advance(sentinel);
                }
            }
            topk.insert(score, d);
            cursors.sort_by_key(|c| c.cursor.value(sentinel));
        } else {
            let q = (0..p).rev().find(|&i| cursors[i].cursor.value(sentinel) < d);
            match q {
                Some(q) => {
                    cursors[q].cursor.advance_to_geq(d, sentinel);
                    bubble_right(&mut cursors, q, sentinel);
                }
                None => break,
            }
        }
    }

    Ok(topk.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::BinaryFreqCollection;
    use crate::config::IndexConfig;
    use crate::index::IndexBuilder;
    use crate::wand::build_fixed;

    fn u32_list(values: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for &v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// 20 documents, three terms with overlapping posting lists so MaxScore's
    /// essential/non-essential split and BMW's pivot logic both get exercised.
    fn multi_term_collection() -> BinaryFreqCollection {
        let num_docs = 20u32;
        let term0_docs: Vec<u32> = (0..20).step_by(2).collect(); // even docs
        let term1_docs: Vec<u32> = (0..20).step_by(3).collect(); // every third doc
        let term2_docs: Vec<u32> = vec![5, 6, 7, 15, 16, 17];

        let mut docs = u32_list(&[num_docs]);
        docs.extend(u32_list(&term0_docs));
        docs.extend(u32_list(&term1_docs));
        docs.extend(u32_list(&term2_docs));

        let term0_freqs: Vec<u32> = term0_docs.iter().map(|d| 1 + d % 3).collect();
        let term1_freqs: Vec<u32> = term1_docs.iter().map(|d| 1 + d % 4).collect();
        let term2_freqs: Vec<u32> = vec![5, 3, 2, 4, 1, 6];

        let mut freqs = u32_list(&term0_freqs);
        freqs.extend(u32_list(&term1_freqs));
        freqs.extend(u32_list(&term2_freqs));

        let lengths: Vec<u32> = (0..num_docs).map(|d| 10 + d % 5).collect();
        let mut sizes = u32_list(&[num_docs]);
        sizes.extend(u32_list(&lengths));

        BinaryFreqCollection::from_bytes(docs, freqs, sizes).unwrap()
    }

    #[test]
    fn taat_maxscore_bmw_agree_on_top_k() {
        let coll = multi_term_collection();
        let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
        let index = BlockInvertedIndex::open(index_bytes).unwrap();
        let lengths = coll.doc_lengths().to_vec();
        let bm25 = Bm25::new(&lengths);
        let wand_bytes = build_fixed(&index, &bm25, &IndexConfig::default()).unwrap();
        let wand = WandData::open(wand_bytes).unwrap();

        let df0 = index.cursor(0).unwrap().size() as u32;
        let df1 = index.cursor(1).unwrap().size() as u32;
        let df2 = index.cursor(2).unwrap().size() as u32;
        let qw0 = bm25.query_term_weight(1.0, df0);
        let qw1 = bm25.query_term_weight(1.0, df1);
        let qw2 = bm25.query_term_weight(1.0, df2);

        let query = vec![(0u32, qw0), (1u32, qw1), (2u32, qw2)];
        let k = 5;

        let mut scratch = QueryScratch::new(index.num_docs() as usize);
        let taat = query_taat(&index, &bm25, &query, k, &mut scratch).unwrap();
        let maxscore = query_maxscore(&index, &wand, &bm25, &query, k).unwrap();
        let bmw = query_bmw(&index, &wand, &bm25, &query, k).unwrap();

        assert_eq!(taat, maxscore);
        assert_eq!(taat, bmw);
        assert_eq!(taat.len(), k);
    }

    #[test]
    fn single_term_query_matches_posting_list_scores() {
        let coll = multi_term_collection();
        let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
        let index = BlockInvertedIndex::open(index_bytes).unwrap();
        let lengths = coll.doc_lengths().to_vec();
        let bm25 = Bm25::new(&lengths);
        let wand_bytes = build_fixed(&index, &bm25, &IndexConfig::default()).unwrap();
        let wand = WandData::open(wand_bytes).unwrap();

        let df2 = index.cursor(2).unwrap().size() as u32;
        let qw2 = bm25.query_term_weight(1.0, df2);
        let query = vec![(2u32, qw2)];
        let k = 3;

        let mut scratch = QueryScratch::new(index.num_docs() as usize);
        let taat = query_taat(&index, &bm25, &query, k, &mut scratch).unwrap();
        let maxscore = query_maxscore(&index, &wand, &bm25, &query, k).unwrap();
        let bmw = query_bmw(&index, &wand, &bm25, &query, k).unwrap();

        assert_eq!(taat, maxscore);
        assert_eq!(taat, bmw);
    }

    #[test]
    fn empty_query_returns_empty_results() {
        let coll = multi_term_collection();
        let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
        let index = BlockInvertedIndex::open(index_bytes).unwrap();
        let lengths = coll.doc_lengths().to_vec();
        let bm25 = Bm25::new(&lengths);
        let wand_bytes = build_fixed(&index, &bm25, &IndexConfig::default()).unwrap();
        let wand = WandData::open(wand_bytes).unwrap();

        let mut scratch = QueryScratch::new(index.num_docs() as usize);
        let query: Vec<(u32, f32)> = vec![];
        assert!(query_taat(&index, &bm25, &query, 5, &mut scratch).unwrap().is_empty());
        assert!(query_maxscore(&index, &wand, &bm25, &query, 5).unwrap().is_empty());
        assert!(query_bmw(&index, &wand, &bm25, &query, 5).unwrap().is_empty());
    }
}
