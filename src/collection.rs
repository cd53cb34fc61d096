//! Reader for the "binary frequency collection" ingestion format: three
//! parallel files (`docs`, `freqs`, `sizes`) consumed by [`crate::index::IndexBuilder`].
//!
//! Per the governing design document's resolution of an open question: the
//! sizes file carries the same redundant `{n=1,[N]}` leading list as the docs
//! file even though its payload is always exactly `N` entries. This reader
//! parses that header literally (and checks it against the docs file's `N`)
//! rather than special-casing it away.

use crate::error::BuilderError;

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes.get(offset..offset + 4).map(|s| u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

/// Owns the three input files' bytes and exposes the per-term lists they encode.
pub struct BinaryFreqCollection {
    docs: Vec<u8>,
    freqs: Vec<u8>,
    sizes: Vec<u32>,
    num_docs: u32,
    /// Byte offset in `docs`/`freqs` where the first per-term list begins.
    docs_start: usize,
}

impl BinaryFreqCollection {
    pub fn from_bytes(docs: Vec<u8>, freqs: Vec<u8>, sizes: Vec<u8>) -> Result<Self, BuilderError> {
        let header_n = read_u32_le(&docs, 0)
            .ok_or_else(|| io_err("docs file truncated reading leading header count"))?;
        if header_n != 1 {
            return Err(io_err("docs file's leading list must have n = 1"));
        }
        let num_docs =
            read_u32_le(&docs, 4).ok_or_else(|| io_err("docs file truncated reading N"))?;

        let sizes_header_n = read_u32_le(&sizes, 0)
            .ok_or_else(|| io_err("sizes file truncated reading leading header count"))?;
        if sizes_header_n != 1 {
            return Err(io_err("sizes file's leading list must have n = 1"));
        }
        let sizes_header_big_n = read_u32_le(&sizes, 4)
            .ok_or_else(|| io_err("sizes file truncated reading N"))?;
        if sizes_header_big_n != num_docs {
            return Err(io_err("sizes file's N does not match docs file's N"));
        }
        let sizes_list_n = read_u32_le(&sizes, 8)
            .ok_or_else(|| io_err("sizes file truncated reading its own list length"))?;
        if sizes_list_n != num_docs {
            return Err(io_err("sizes file's document-length list length does not equal N"));
        }
        let mut sizes_out = Vec::with_capacity(num_docs as usize);
        for i in 0..num_docs as usize {
            let v = read_u32_le(&sizes, 12 + i * 4)
                .ok_or_else(|| io_err("sizes file truncated reading document lengths"))?;
            sizes_out.push(v);
        }

        Ok(BinaryFreqCollection { docs, freqs, sizes: sizes_out, num_docs, docs_start: 8 })
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn doc_lengths(&self) -> &[u32] {
        &self.sizes
    }

    /// Iterates the per-term `(term_id, docids, freqs)` lists in order.
    pub fn terms(&self) -> CollectionIter<'_> {
        CollectionIter { coll: self, docs_off: self.docs_start, freqs_off: 0, term_id: 0 }
    }
}

fn read_u32_list(bytes: &[u8], start: usize, count: usize) -> Vec<u32> {
    (0..count)
        .map(|i| {
            let o = start + i * 4;
            u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]])
        })
        .collect()
}

fn io_err(detail: &str) -> BuilderError {
    BuilderError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, detail.to_string()))
}

pub struct CollectionIter<'a> {
    coll: &'a BinaryFreqCollection,
    docs_off: usize,
    freqs_off: usize,
    term_id: u32,
}

impl<'a> Iterator for CollectionIter<'a> {
    type Item = Result<(u32, Vec<u32>, Vec<u32>), BuilderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.docs_off >= self.coll.docs.len() {
            return None;
        }
        let term_id = self.term_id;
        let n = match read_u32_le(&self.coll.docs, self.docs_off) {
            Some(n) => n,
            None => return None,
        };
        let docs_payload_start = self.docs_off + 4;
        let docs_payload_end = docs_payload_start + 4 * n as usize;
        let freqs_n = match read_u32_le(&self.coll.freqs, self.freqs_off) {
            Some(v) => v,
            None => {
                return Some(Err(BuilderError::LengthMismatch { term_id, docs_len: n, freqs_len: 0 }))
            }
        };
        if freqs_n != n {
            return Some(Err(BuilderError::LengthMismatch {
                term_id,
                docs_len: n,
                freqs_len: freqs_n,
            }));
        }
        let freqs_payload_start = self.freqs_off + 4;
        let freqs_payload_end = freqs_payload_start + 4 * n as usize;

        if self.coll.docs.get(docs_payload_start..docs_payload_end).is_none() {
            return Some(Err(io_err("docs file truncated reading term's posting list")));
        }
        if self.coll.freqs.get(freqs_payload_start..freqs_payload_end).is_none() {
            return Some(Err(io_err("freqs file truncated reading term's posting list")));
        }
        let docs = read_u32_list(&self.coll.docs, docs_payload_start, n as usize);
        let freqs = read_u32_list(&self.coll.freqs, freqs_payload_start, n as usize);

        self.docs_off = docs_payload_end;
        self.freqs_off = freqs_payload_end;
        self.term_id += 1;

        for (i, w) in docs.windows(2).enumerate() {
            if w[0] >= w[1] {
                return Some(Err(BuilderError::NonMonotone {
                    term_id,
                    position: i as u32 + 1,
                    prev: w[0],
                    current: w[1],
                }));
            }
        }
        if docs.is_empty() {
            return Some(Err(BuilderError::EmptyList { term_id }));
        }

        Some(Ok((term_id, docs, freqs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_list(values: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for &v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    #[test]
    fn parses_two_term_collection() {
        let num_docs = 5u32;
        let mut docs = u32_list(&[num_docs]);
        docs.extend(u32_list(&[0, 2, 4]));
        docs.extend(u32_list(&[1, 3]));

        let mut freqs = u32_list(&[1, 2, 1]);
        freqs.extend(u32_list(&[3, 1]));

        let mut sizes = u32_list(&[num_docs]);
        sizes.extend(u32_list(&[10, 20, 30, 40, 50]));

        let coll = BinaryFreqCollection::from_bytes(docs, freqs, sizes).unwrap();
        assert_eq!(coll.num_docs(), 5);
        assert_eq!(coll.doc_lengths(), &[10, 20, 30, 40, 50]);

        let terms: Vec<_> = coll.terms().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0], (0, vec![0u32, 2, 4], vec![1u32, 2, 1]));
        assert_eq!(terms[1], (1, vec![1u32, 3], vec![3u32, 1]));
    }

    #[test]
    fn rejects_length_mismatch() {
        let num_docs = 3u32;
        let mut docs = u32_list(&[num_docs]);
        docs.extend(u32_list(&[0, 1]));
        let freqs = u32_list(&[1]); // only one freq for two docs
        let mut sizes = u32_list(&[num_docs]);
        sizes.extend(u32_list(&[1, 1, 1]));

        let coll = BinaryFreqCollection::from_bytes(docs, freqs, sizes).unwrap();
        let err = coll.terms().next().unwrap().unwrap_err();
        assert!(matches!(err, BuilderError::LengthMismatch { .. }));
    }
}
