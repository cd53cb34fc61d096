//! Pluggable byte-source backend for an opened index: a real memory-mapped
//! file or an in-memory buffer behind the same trait, so tests and embedders
//! that do not want a filesystem can open an index from bytes they already
//! hold.
//!
//! Grounded on `rank-retrieve/src/persistence/directory.rs`'s `Directory`
//! trait / `FsDirectory` split between a real-filesystem backend and an
//! in-memory one used in tests.

use std::path::Path;

use crate::error::IndexError;

/// A read-only byte source an index or WAND-data file can be opened from.
pub trait IndexSource: Send + Sync {
    fn bytes(&self) -> &[u8];
}

impl IndexSource for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }
}

/// A plain in-memory byte buffer, used in tests and by embedders that build
/// or receive an index's bytes without going through the filesystem.
pub struct InMemorySource {
    data: Vec<u8>,
}

impl InMemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        InMemorySource { data }
    }
}

impl IndexSource for InMemorySource {
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(feature = "mmap")]
pub use mmap_backend::MmapSource;

#[cfg(feature = "mmap")]
mod mmap_backend {
    use super::*;
    use memmap2::Mmap;
    use std::fs::File;

    /// A memory-mapped file, advised sequential-access where the platform supports it.
    pub struct MmapSource {
        mmap: Mmap,
    }

    impl MmapSource {
        pub fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
            let file = File::open(path.as_ref())?;
            // SAFETY: the file is not expected to be mutated concurrently by another
            // process while mapped; callers that violate this get unspecified (not
            // unsound-by-Rust's-rules) contents, matching mmap's usual contract.
            let mmap = unsafe { Mmap::map(&file)? };
            #[cfg(unix)]
            {
                let _ = mmap.advise(memmap2::Advice::Sequential);
            }
            Ok(MmapSource { mmap })
        }
    }

    impl IndexSource for MmapSource {
        fn bytes(&self) -> &[u8] {
            &self.mmap
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_source_roundtrips_bytes() {
        let src = InMemorySource::new(vec![1, 2, 3, 4]);
        assert_eq!(src.bytes(), &[1, 2, 3, 4]);
    }
}
