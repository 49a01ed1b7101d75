//! Thresholds for plan diagnostics
//!
//! Every rule reads its limits from [`AnalyzerThresholds`]; the values can be
//! overridden from the `[thresholds]` section of the configuration file.

use serde::{Deserialize, Serialize};

/// Default threshold values
pub mod defaults {
    /// Seq Scan output rows above which the scan is flagged (S001)
    pub const SEQ_SCAN_ROWS: u64 = 1000;

    /// Seq Scan output rows above which a filter index is suggested
    pub const INDEX_CANDIDATE_ROWS: u64 = 1000;

    /// actual/planned ratio above which the estimate is considered poor (E001)
    pub const ESTIMATE_RATIO_HIGH: f64 = 10.0;

    /// actual/planned ratio below which the estimate is considered poor (E001)
    pub const ESTIMATE_RATIO_LOW: f64 = 0.1;

    /// Sort rows (T001)
    pub const SORT_ROWS: u64 = 1000;

    /// Nested Loop output rows (J001)
    pub const NESTED_LOOP_ROWS: u64 = 1000;

    /// Rows discarded by a filter (F001)
    pub const ROWS_REMOVED_BY_FILTER: u64 = 1000;

    /// Executions of a single node (L001)
    pub const MAX_LOOPS: u64 = 100;

    /// Share of node time spent in I/O (I001)
    pub const IO_BOUND_RATIO: f64 = 0.5;

    /// Node time below which I/O share is not checked (I001)
    pub const IO_BOUND_MIN_TIME_MS: f64 = 1000.0;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerThresholds {
    pub seq_scan_rows: u64,
    pub index_candidate_rows: u64,
    pub estimate_ratio_high: f64,
    pub estimate_ratio_low: f64,
    pub sort_rows: u64,
    pub nested_loop_rows: u64,
    pub rows_removed_by_filter: u64,
    pub max_loops: u64,
    pub io_bound_ratio: f64,
    pub io_bound_min_time_ms: f64,
}

impl Default for AnalyzerThresholds {
    fn default() -> Self {
        Self {
            seq_scan_rows: defaults::SEQ_SCAN_ROWS,
            index_candidate_rows: defaults::INDEX_CANDIDATE_ROWS,
            estimate_ratio_high: defaults::ESTIMATE_RATIO_HIGH,
            estimate_ratio_low: defaults::ESTIMATE_RATIO_LOW,
            sort_rows: defaults::SORT_ROWS,
            nested_loop_rows: defaults::NESTED_LOOP_ROWS,
            rows_removed_by_filter: defaults::ROWS_REMOVED_BY_FILTER,
            max_loops: defaults::MAX_LOOPS,
            io_bound_ratio: defaults::IO_BOUND_RATIO,
            io_bound_min_time_ms: defaults::IO_BOUND_MIN_TIME_MS,
        }
    }
}

impl AnalyzerThresholds {
    /// Whether an actual/planned ratio falls outside the accepted band
    pub fn is_poor_estimate(&self, ratio: f64) -> bool {
        ratio > self.estimate_ratio_high || ratio < self.estimate_ratio_low
    }
}
