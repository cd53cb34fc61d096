//! End-to-end scenarios and the central equivalence property: TAAT, MaxScore,
//! and Block-Max WAND must return the same top-k set.

use pisars::prelude::*;
use pisars::topk::TopKQueue;
use proptest::prelude::*;

fn u32_list(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn build_collection(num_docs: u32, term_postings: &[(Vec<u32>, Vec<u32>)], lengths: &[u32]) -> BinaryFreqCollection {
    let mut docs = u32_list(&[num_docs]);
    for (d, _) in term_postings {
        docs.extend(u32_list(d));
    }
    let mut freqs = Vec::new();
    for (_, f) in term_postings {
        freqs.extend(u32_list(f));
    }
    let mut sizes = u32_list(&[num_docs]);
    sizes.extend(u32_list(lengths));
    BinaryFreqCollection::from_bytes(docs, freqs, sizes).unwrap()
}

/// S1. Single-term TAAT against a hand-computed BM25 ranking.
#[test]
fn s1_single_term_taat_matches_hand_computed_scores() {
    let num_docs = 5u32;
    let coll = build_collection(num_docs, &[(vec![0, 2, 4], vec![1, 3, 1])], &[1, 1, 1, 1, 1]);
    let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
    let index = BlockInvertedIndex::open(index_bytes).unwrap();
    let lengths = coll.doc_lengths().to_vec();
    let bm25 = Bm25::new(&lengths);

    let qtw = bm25.query_term_weight(1.0, 3);
    assert!(qtw > 0.0);
    assert!((qtw - 1e-6 * 2.2).abs() < 1e-6, "qtw = {qtw}");

    let query = vec![(0u32, qtw)];
    let mut scratch = QueryScratch::new(index.num_docs() as usize);
    let result = query_taat(&index, &bm25, &query, 3, &mut scratch).unwrap();

    assert_eq!(result.len(), 3);
    let docids: Vec<u32> = result.iter().map(|&(_, d)| d).collect();
    assert_eq!(docids, vec![2, 0, 4]);

    let expected_2 = qtw * (3.0 / 4.2);
    let expected_0 = qtw * (1.0 / 2.2);
    assert!((result[0].0 - expected_2).abs() < 1e-6);
    assert!((result[1].0 - expected_0).abs() < 1e-6);
}

/// S2/S3. Two-term disjunction: TAAT, MaxScore, and BMW (over fixed-block-1
/// WAND data) all agree on the top-2.
#[test]
fn s2_s3_two_term_disjunction_all_algorithms_agree() {
    let num_docs = 4u32;
    let term_a = (vec![0, 1, 3], vec![1, 1, 1]);
    let term_b = (vec![1, 2], vec![2, 1]);
    let coll = build_collection(num_docs, &[term_a, term_b], &[1, 1, 1, 1]);
    let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
    let index = BlockInvertedIndex::open(index_bytes).unwrap();
    let lengths = coll.doc_lengths().to_vec();
    let bm25 = Bm25::new(&lengths);

    let mut cfg = IndexConfig::default();
    cfg.log_partition_size = 0; // block size 1, per S3
    let wand_bytes = build_fixed(&index, &bm25, &cfg).unwrap();
    let wand = WandData::open(wand_bytes).unwrap();

    let qtw_a = bm25.query_term_weight(1.0, 3);
    let qtw_b = bm25.query_term_weight(1.0, 2);
    let query = vec![(0u32, qtw_a), (1u32, qtw_b)];
    let k = 2;

    let mut scratch = QueryScratch::new(index.num_docs() as usize);
    let taat = query_taat(&index, &bm25, &query, k, &mut scratch).unwrap();
    let maxscore = query_maxscore(&index, &wand, &bm25, &query, k).unwrap();
    let bmw = query_bmw(&index, &wand, &bm25, &query, k).unwrap();

    assert_eq!(taat, maxscore);
    assert_eq!(taat, bmw);
    assert_eq!(taat.len(), 2);
}

/// S4. Cursor seek past the end of a posting list clamps to the sentinel.
#[test]
fn s4_cursor_seek_past_end() {
    let num_docs = 10u32;
    let coll = build_collection(num_docs, &[(vec![3, 7, 9], vec![1, 1, 1])], &vec![1; 10]);
    let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
    let index = BlockInvertedIndex::open(index_bytes).unwrap();
    let sentinel = index.num_docs();
    let mut cur = index.cursor(0).unwrap();

    assert_eq!(cur.advance_to_geq(8, sentinel), 9);
    assert_eq!(cur.advance_to_geq(10, sentinel), sentinel);
}

/// S5. An all-ones monotone sequence needs no payload bits.
#[test]
fn s5_dispatcher_picks_all_ones() {
    use pisars::config::IndexConfig;
    use pisars::sequence::MonotoneSequence;

    let values: Vec<u64> = (0..5).collect();
    let seq = MonotoneSequence::build(&values, 5, &IndexConfig::default());
    assert!(matches!(seq, MonotoneSequence::AllOnes(_)));
    for i in 0..5usize {
        assert_eq!(seq.get(i), i as u64);
    }
}

/// S6. Quantized roundtrip of a single score.
#[test]
fn s6_quantized_roundtrip() {
    use pisars::Quantizer;

    let q = Quantizer::new(10.0, 8);
    let quantized = q.quantize(3.7);
    assert_eq!(quantized, 94);
    let back = q.dequantize(quantized);
    assert!((back - 3.686).abs() < 0.01);
    assert!((back - 3.7).abs() <= 10.0 / 510.0 + 1e-3);
}

#[test]
fn topk_threshold_is_non_decreasing_across_a_run() {
    let mut q = TopKQueue::new(3);
    let mut last = f32::NEG_INFINITY;
    for s in [1.0, 5.0, 2.0, 9.0, 0.5, 4.0, 8.0, 0.1] {
        q.insert(s, 0);
        assert!(q.threshold() >= last);
        last = q.threshold();
    }
}

#[test]
fn finalize_is_idempotent_given_the_same_entries() {
    let mut q1 = TopKQueue::new(3);
    let mut q2 = TopKQueue::new(3);
    for (s, d) in [(1.0, 0u32), (5.0, 1), (3.0, 2), (4.0, 3)] {
        q1.insert(s, d);
        q2.insert(s, d);
    }
    assert_eq!(q1.finalize(), q2.finalize());
}

fn posting_pair(num_docs: u32, max_terms_docs: usize) -> impl Strategy<Value = Vec<(Vec<u32>, Vec<u32>)>> {
    prop::collection::vec(
        prop::collection::btree_set(0u32..num_docs, 1..max_terms_docs.min(num_docs as usize).max(2))
            .prop_flat_map(move |docs_set| {
                let docs: Vec<u32> = docs_set.into_iter().collect();
                let n = docs.len();
                prop::collection::vec(1u32..20, n).prop_map(move |freqs| (docs.clone(), freqs))
            }),
        1..5,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn taat_maxscore_bmw_agree_on_synthetic_queries(term_postings in posting_pair(60, 20)) {
        let num_docs = 60u32;
        let lengths: Vec<u32> = (0..num_docs).map(|d| 20 + d % 7).collect();
        let coll = build_collection(num_docs, &term_postings, &lengths);
        let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
        let index = BlockInvertedIndex::open(index_bytes).unwrap();
        let doc_lengths = coll.doc_lengths().to_vec();
        let bm25 = Bm25::new(&doc_lengths);
        let wand_bytes = build_fixed(&index, &bm25, &IndexConfig::default()).unwrap();
        let wand = WandData::open(wand_bytes).unwrap();

        let query: Vec<(u32, f32)> = (0..term_postings.len() as u32)
            .map(|t| {
                let df = index.cursor(t).unwrap().size() as u32;
                (t, bm25.query_term_weight(1.0, df))
            })
            .collect();

        let k = 5;
        let mut scratch = QueryScratch::new(index.num_docs() as usize);
        let taat = query_taat(&index, &bm25, &query, k, &mut scratch).unwrap();
        let maxscore = query_maxscore(&index, &wand, &bm25, &query, k).unwrap();
        let bmw = query_bmw(&index, &wand, &bm25, &query, k).unwrap();

        prop_assert_eq!(&taat, &maxscore);
        prop_assert_eq!(&taat, &bmw);
    }
}
