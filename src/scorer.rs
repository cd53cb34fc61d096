//! BM25 scoring and the linear score quantizer.
//!
//! Byte-for-byte grounded on `original_source/scorer/bm25.hpp`'s constants
//! (`k1 = 1.2`, `b = 0.5`) and formulas, which differ from the `rank-retrieve`
//! crate's own `Bm25Params` default (`b = 0.75`, a different IDF variant);
//! the teacher's `Bm25Params`-as-a-struct shape is kept, its numbers are not.

/// BM25 over a collection's document lengths. Construct once per index and
/// reuse across queries; [`Bm25::for_term`] produces a per-term closure-like
/// scorer cheap enough to build per query.
pub struct Bm25<'a> {
    doc_lengths: &'a [u32],
    avg_length: f32,
    num_docs: u32,
    k1: f32,
    b: f32,
}

const QUERY_WEIGHT_EPS: f32 = 1e-6;

impl<'a> Bm25<'a> {
    pub fn new(doc_lengths: &'a [u32]) -> Self {
        let num_docs = doc_lengths.len() as u32;
        let avg_length = if num_docs == 0 {
            0.0
        } else {
            (doc_lengths.iter().map(|&l| l as f64).sum::<f64>() / num_docs as f64) as f32
        };
        Bm25 { doc_lengths, avg_length, num_docs, k1: 1.2, b: 0.5 }
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn avg_length(&self) -> f32 {
        self.avg_length
    }

    pub fn doc_lengths(&self) -> &'a [u32] {
        self.doc_lengths
    }

    /// `length(d) / avg_length`; `0.0` for an empty collection.
    pub fn norm_len(&self, d: u32) -> f32 {
        if self.avg_length == 0.0 {
            0.0
        } else {
            self.doc_lengths[d as usize] as f32 / self.avg_length
        }
    }

    pub fn doc_term_weight(&self, freq: u32, norm_len: f32) -> f32 {
        let f = freq as f32;
        f / (f + self.k1 * (1.0 - self.b + self.b * norm_len))
    }

    pub fn query_term_weight(&self, qf: f32, df: u32) -> f32 {
        let n = self.num_docs as f32;
        let dff = df as f32;
        let idf = ((n - dff + 0.5) / (dff + 0.5)).ln().max(QUERY_WEIGHT_EPS);
        qf * idf * (1.0 + self.k1)
    }

    /// Builds a per-term scorer with `query_weight` precomputed from `qf`/`df`.
    pub fn for_term(&self, df: u32, qf: f32) -> TermScorer<'_> {
        TermScorer { bm25: self, query_weight: self.query_term_weight(qf, df) }
    }
}

/// A term's BM25 scorer, closed over its precomputed query-term weight.
pub struct TermScorer<'a> {
    bm25: &'a Bm25<'a>,
    query_weight: f32,
}

impl<'a> TermScorer<'a> {
    pub fn query_weight(&self) -> f32 {
        self.query_weight
    }

    /// `query_term_weight * doc_term_weight(freq, norm_len(docid))`.
    pub fn score(&self, docid: u32, freq: u32) -> f32 {
        let norm_len = self.bm25.norm_len(docid);
        self.query_weight * self.bm25.doc_term_weight(freq, norm_len)
    }
}

/// Affine map from `[0, S_max]` to `[0, 2^B - 1]`, and back.
#[derive(Debug, Clone, Copy)]
pub struct Quantizer {
    s_max: f32,
    levels: u32,
}

impl Quantizer {
    pub fn new(s_max: f32, bits: u8) -> Self {
        assert!(bits >= 1 && bits <= 32);
        Quantizer { s_max, levels: (1u32 << bits) - 1 }
    }

    pub fn quantize(&self, s: f32) -> u32 {
        if self.s_max <= 0.0 {
            return 0;
        }
        let q = (s * self.levels as f32 / self.s_max).round();
        q.clamp(0.0, self.levels as f32) as u32
    }

    pub fn dequantize(&self, q: u32) -> f32 {
        if self.levels == 0 {
            return 0.0;
        }
        q as f32 * self.s_max / self.levels as f32
    }
}
