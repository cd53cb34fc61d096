//! Per-term block-decode counters, active only when the `profile` feature is
//! enabled. Growth of the term-keyed map is guarded by a mutex; the counters
//! themselves are atomics so a cursor's hot path never takes a lock to bump
//! them once its term's entry exists.

#[cfg(feature = "profile")]
use std::collections::HashMap;
#[cfg(feature = "profile")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "profile")]
use std::sync::{Mutex, OnceLock};

#[cfg(feature = "profile")]
#[derive(Default)]
pub struct TermCounters {
    pub docs_decoded: AtomicU64,
    pub freqs_decoded: AtomicU64,
}

#[cfg(feature = "profile")]
static COUNTERS: OnceLock<Mutex<HashMap<u32, &'static TermCounters>>> = OnceLock::new();

#[cfg(feature = "profile")]
fn counters_for(term_id: u32) -> &'static TermCounters {
    let map = COUNTERS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = map.lock().unwrap();
    *guard.entry(term_id).or_insert_with(|| Box::leak(Box::new(TermCounters::default())))
}

#[cfg(feature = "profile")]
pub fn record_block_decoded(term_id: u32) {
    counters_for(term_id).docs_decoded.fetch_add(1, Ordering::Relaxed);
}

#[cfg(feature = "profile")]
pub fn record_freqs_decoded(term_id: u32) {
    counters_for(term_id).freqs_decoded.fetch_add(1, Ordering::Relaxed);
}

#[cfg(feature = "profile")]
pub fn snapshot(term_id: u32) -> (u64, u64) {
    let c = counters_for(term_id);
    (c.docs_decoded.load(Ordering::Relaxed), c.freqs_decoded.load(Ordering::Relaxed))
}

#[cfg(not(feature = "profile"))]
#[inline(always)]
pub fn record_block_decoded(_term_id: u32) {}

#[cfg(not(feature = "profile"))]
#[inline(always)]
pub fn record_freqs_decoded(_term_id: u32) {}
