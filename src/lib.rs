//! A block-compressed inverted index core: bit-packed posting lists over a
//! monotone-sequence endpoint table, BM25/WAND scoring, and three top-k
//! retrieval algorithms (exhaustive TAAT, MaxScore, Block-Max WAND) that
//! agree on their results up to quantization.
//!
//! Typical flow: read a [`collection::BinaryFreqCollection`], build an index
//! with [`index::IndexBuilder`], optionally build [`wand::WandData`] for it,
//! then run one of [`query::query_taat`], [`query::query_maxscore`], or
//! [`query::query_bmw`] against both.

pub mod bitvector;
pub mod broadword;
pub mod codec;
pub mod collection;
pub mod config;
pub mod directory;
pub mod error;
pub mod index;
pub mod postings;
pub mod profile;
pub mod query;
pub mod scorer;
pub mod sequence;
pub mod topk;
pub mod wand;

pub use collection::BinaryFreqCollection;
pub use config::{IndexConfig, QueryConfig};
pub use directory::{IndexSource, InMemorySource};
pub use error::{BuilderError, IndexError};
pub use index::{BlockInvertedIndex, IndexBuilder};
pub use postings::BlockPostingCursor;
pub use query::{query_bmw, query_maxscore, query_taat, QueryScratch};
pub use scorer::{Bm25, Quantizer, TermScorer};
pub use topk::TopKQueue;
pub use wand::{build_fixed, build_variable, WandCursor, WandData};

#[cfg(feature = "mmap")]
pub use directory::MmapSource;

/// Common imports for building a collection, index, and WAND data, and
/// running all three retrieval algorithms against them.
pub mod prelude {
    pub use crate::collection::BinaryFreqCollection;
    pub use crate::config::{IndexConfig, QueryConfig};
    pub use crate::directory::IndexSource;
    pub use crate::index::{BlockInvertedIndex, IndexBuilder};
    pub use crate::query::{query_bmw, query_maxscore, query_taat, QueryScratch};
    pub use crate::scorer::Bm25;
    pub use crate::wand::{build_fixed, build_variable, WandData};
}
