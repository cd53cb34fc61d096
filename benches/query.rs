//! End-to-end query throughput for the three retrieval algorithms against a
//! synthetic multi-term collection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pisars::prelude::*;
use pisars::QueryScratch;

fn u32_list(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for &v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// `num_docs` documents, each of `num_terms` terms hitting roughly one in
/// `stride` documents, so posting lists overlap enough to exercise pruning.
fn synthetic_collection(num_docs: u32, num_terms: u32, stride: u32) -> BinaryFreqCollection {
    let mut docs = u32_list(&[num_docs]);
    let mut freqs = Vec::new();
    let mut term_lists = Vec::new();

    for t in 0..num_terms {
        let offset = t % stride;
        let list: Vec<u32> = (offset..num_docs).step_by(stride as usize).collect();
        let list_freqs: Vec<u32> = list.iter().map(|d| 1 + d % 5).collect();
        term_lists.push((list, list_freqs));
    }
    for (list, _) in &term_lists {
        docs.extend(u32_list(list));
    }
    for (_, list_freqs) in &term_lists {
        freqs.extend(u32_list(list_freqs));
    }

    let lengths: Vec<u32> = (0..num_docs).map(|d| 50 + d % 20).collect();
    let mut sizes = u32_list(&[num_docs]);
    sizes.extend(u32_list(&lengths));

    BinaryFreqCollection::from_bytes(docs, freqs, sizes).unwrap()
}

fn bench_queries(c: &mut Criterion) {
    let num_docs = 50_000u32;
    let num_terms = 16u32;
    let stride = 7u32;

    let coll = synthetic_collection(num_docs, num_terms, stride);
    let index_bytes = IndexBuilder::build(&coll, IndexConfig::default()).unwrap();
    let index = BlockInvertedIndex::open(index_bytes).unwrap();
    let lengths = coll.doc_lengths().to_vec();
    let bm25 = Bm25::new(&lengths);
    let wand_bytes = build_fixed(&index, &bm25, &IndexConfig::default()).unwrap();
    let wand = WandData::open(wand_bytes).unwrap();

    let query: Vec<(u32, f32)> = (0..num_terms)
        .map(|t| {
            let df = index.cursor(t).unwrap().size() as u32;
            (t, bm25.query_term_weight(1.0, df))
        })
        .collect();

    let mut group = c.benchmark_group("query");
    for &k in &[10usize, 100] {
        let mut scratch = QueryScratch::new(index.num_docs() as usize);
        group.bench_with_input(BenchmarkId::new("taat", k), &k, |b, &k| {
            b.iter(|| black_box(query_taat(&index, &bm25, &query, k, &mut scratch).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("maxscore", k), &k, |b, &k| {
            b.iter(|| black_box(query_maxscore(&index, &wand, &bm25, &query, k).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("bmw", k), &k, |b, &k| {
            b.iter(|| black_box(query_bmw(&index, &wand, &bm25, &query, k).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
