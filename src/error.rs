//! Error types for the index core.
//!
//! Structured enums with manual `Display`/`Error` impls, matching the rest of
//! the `rank-*` ecosystem: no `thiserror`, no `anyhow`, because the set of
//! error kinds is small and fixed and callers are expected to match on it.

use std::fmt;

/// Errors raised while opening or querying a [`crate::index::BlockInvertedIndex`]
/// or [`crate::wand::WandData`].
#[derive(Debug)]
pub enum IndexError {
    /// The underlying file or mapping could not be opened.
    Io(std::io::Error),
    /// The on-disk header failed a structural check (truncated, wrong length).
    MalformedHeader { field: String, detail: String },
    /// `cursor(term_id)` was called with `term_id >= num_terms()`.
    TermOutOfRange { term_id: u32, num_terms: u32 },
    /// A block posting list's internal lengths were inconsistent with its header.
    CorruptPostingList { term_id: u32, detail: String },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Io(e) => write!(f, "I/O error opening index: {e}"),
            IndexError::MalformedHeader { field, detail } => {
                write!(f, "malformed index header at field `{field}`: {detail}")
            }
            IndexError::TermOutOfRange { term_id, num_terms } => {
                write!(f, "term id {term_id} >= T ({num_terms})")
            }
            IndexError::CorruptPostingList { term_id, detail } => {
                write!(f, "corrupt posting list for term {term_id}: {detail}")
            }
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e)
    }
}

/// Errors raised by [`crate::index::IndexBuilder`] while constructing an index
/// from a [`crate::collection::BinaryFreqCollection`].
#[derive(Debug)]
pub enum BuilderError {
    /// The docs/freqs/sizes files disagree on a posting list's length.
    LengthMismatch { term_id: u32, docs_len: u32, freqs_len: u32 },
    /// A term's docids were not strictly increasing.
    NonMonotone { term_id: u32, position: u32, prev: u32, current: u32 },
    /// A posting list passed to the builder had zero postings.
    EmptyList { term_id: u32 },
    /// Underlying I/O failure while reading the collection or writing the index.
    Io(std::io::Error),
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderError::LengthMismatch { term_id, docs_len, freqs_len } => write!(
                f,
                "term {term_id}: docs file has {docs_len} postings, freqs file has {freqs_len}"
            ),
            BuilderError::NonMonotone { term_id, position, prev, current } => write!(
                f,
                "term {term_id}: docid at position {position} ({current}) does not exceed previous ({prev})"
            ),
            BuilderError::EmptyList { term_id } => {
                write!(f, "term {term_id}: posting list must be non-empty")
            }
            BuilderError::Io(e) => write!(f, "I/O error building index: {e}"),
        }
    }
}

impl std::error::Error for BuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuilderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuilderError {
    fn from(e: std::io::Error) -> Self {
        BuilderError::Io(e)
    }
}
