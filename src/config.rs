//! Explicit configuration structs, passed explicitly at builder- and
//! query-construction time. Nothing here is read from the environment or
//! from process-wide state.

/// Parameters fixed at index-build time: sampling rates for the monotone-sequence
/// dispatcher and the fixed block-size exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// `log2` of the sampling rate for Elias-Fano's `pointers0` (0-bit) table.
    pub ef_log_sampling0: u8,
    /// `log2` of the sampling rate for Elias-Fano's `pointers1` (1-bit) table.
    pub ef_log_sampling1: u8,
    /// `log2` of the sampling rate for ranked-bitvector's rank1 samples.
    pub rb_log_rank1_sampling: u8,
    /// `log2` of the sampling rate for ranked-bitvector's position samples.
    pub rb_log_sampling1: u8,
    /// `log2` of the fixed WAND block size `B_w` (the variable-block
    /// partitioning ignores this and sizes blocks via its own DP).
    pub log_partition_size: u8,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            ef_log_sampling0: 9,
            ef_log_sampling1: 8,
            rb_log_rank1_sampling: 9,
            rb_log_sampling1: 8,
            log_partition_size: 6,
        }
    }
}

impl IndexConfig {
    /// Serializes the five sampling-rate bytes in on-disk order, as stored in
    /// an index's `global_parameters` header.
    pub fn to_bytes(self) -> [u8; 5] {
        [
            self.ef_log_sampling0,
            self.ef_log_sampling1,
            self.rb_log_rank1_sampling,
            self.rb_log_sampling1,
            self.log_partition_size,
        ]
    }

    pub fn from_bytes(bytes: [u8; 5]) -> Self {
        IndexConfig {
            ef_log_sampling0: bytes[0],
            ef_log_sampling1: bytes[1],
            rb_log_rank1_sampling: bytes[2],
            rb_log_sampling1: bytes[3],
            log_partition_size: bytes[4],
        }
    }
}

/// Tunables consulted by the retrieval algorithms and the WAND-data builder.
/// `threshold_wand_list` is carried for API completeness but is documented
/// reserved and unused below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    /// Growth-window ratio for the WAND variable-block-partition DP's cost windows.
    pub eps1: f64,
    /// Geometric growth factor applied to a cost window's upper bound each step.
    pub eps2: f64,
    /// Reserved for future score-loss tolerance; unused by any algorithm in this core.
    pub eps3: f64,
    /// Fixed per-block cost added by the WAND variable-block-partition DP.
    pub fixed_cost: f64,
    /// WAND-specific variant of `eps1`, used instead of `eps1` when building WAND data.
    pub eps1_wand: f64,
    /// WAND-specific variant of `eps2`.
    pub eps2_wand: f64,
    /// WAND-specific variant of `fixed_cost`.
    pub fixed_cost_wand_partition: f64,
    /// Reference collection size used by a heuristic score quantizer; this
    /// crate's [`crate::scorer::Quantizer`] instead takes an explicit
    /// `S_max`/`B` pair, so this field is kept for API completeness only.
    pub reference_size: u32,
    /// Reserved, unused: carried for API completeness but never consulted by
    /// any retrieval algorithm in this crate.
    pub threshold_wand_list: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            eps1: 0.01,
            eps2: 0.4,
            eps3: 0.01,
            fixed_cost: 64.0,
            eps1_wand: 0.01,
            eps2_wand: 0.4,
            fixed_cost_wand_partition: 64.0,
            reference_size: 10_000,
            threshold_wand_list: 0.0,
        }
    }
}
