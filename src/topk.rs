//! Bounded top-k queue: a min-heap of `(score, docid)` with a running
//! admission threshold, shared by all three retrieval algorithms.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct Entry {
    score: f32,
    docid: u32,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.docid == other.docid
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score.partial_cmp(&other.score).unwrap_or(std::cmp::Ordering::Equal).then(self.docid.cmp(&other.docid))
    }
}

/// Bounded min-heap of up to `k` `(score, docid)` entries.
///
/// `set_threshold` can seed an admission floor before the heap fills; while
/// it holds, an entry is admitted only if it clears that floor, even with
/// fewer than `k` entries recorded so far. Without a seed, any entry is
/// admitted until the heap reaches capacity, matching the common case.
pub struct TopKQueue {
    k: usize,
    heap: BinaryHeap<Reverse<Entry>>,
    threshold: f32,
    seeded: bool,
}

impl TopKQueue {
    pub fn new(k: usize) -> Self {
        TopKQueue { k, heap: BinaryHeap::with_capacity(k + 1), threshold: f32::NEG_INFINITY, seeded: false }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn would_enter(&self, s: f32) -> bool {
        if self.heap.len() < self.k && !self.seeded {
            true
        } else {
            s > self.threshold
        }
    }

    pub fn set_threshold(&mut self, tau0: f32) {
        self.threshold = tau0;
        self.seeded = true;
    }

    /// Offers `(s, d)` to the queue. Returns whether it was kept.
    pub fn insert(&mut self, s: f32, d: u32) -> bool {
        if self.k == 0 || !self.would_enter(s) {
            return false;
        }
        self.heap.push(Reverse(Entry { score: s, docid: d }));
        if self.heap.len() > self.k {
            self.heap.pop();
        }
        if self.heap.len() == self.k {
            if let Some(Reverse(min_entry)) = self.heap.peek() {
                self.threshold = min_entry.score;
            }
        }
        true
    }

    /// Sorts the remaining entries descending by score, ascending by docid on ties.
    pub fn finalize(self) -> Vec<(f32, u32)> {
        let mut entries: Vec<Entry> = self.heap.into_iter().map(|Reverse(e)| e).collect();
        entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.docid.cmp(&b.docid)));
        entries.into_iter().map(|e| (e.score, e.docid)).collect()
    }
}
