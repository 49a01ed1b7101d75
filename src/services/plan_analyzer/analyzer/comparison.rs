//! Comparison engine
//!
//! Combines the analyses of the original and optimized query into relative
//! improvement figures and a plan-shape diff.

use crate::services::plan_analyzer::models::constants::node_types;
use crate::services::plan_analyzer::models::{
    ComparisonResult, Improvements, PlanMetrics, PlanShapeDiff, QueryAnalysis, Verdict,
};
use crate::utils::diff_sets;

/// Percentage change from `original` to `optimized`; positive means lower
///
/// A zero (or negative) original yields 0.
pub fn improvement_pct(original: f64, optimized: f64) -> f64 {
    if original <= 0.0 {
        return 0.0;
    }
    (original - optimized) / original * 100.0
}

/// Relative execution and planning time improvement
pub fn compare(original: &PlanMetrics, optimized: &PlanMetrics) -> Improvements {
    Improvements {
        execution_time_pct: improvement_pct(original.execution_time_ms, optimized.execution_time_ms),
        planning_time_pct: improvement_pct(original.planning_time_ms, optimized.planning_time_ms),
        execution_time_diff_ms: original.execution_time_ms - optimized.execution_time_ms,
        planning_time_diff_ms: original.planning_time_ms - optimized.planning_time_ms,
    }
}

pub struct ComparisonEngine;

impl ComparisonEngine {
    /// Build the full comparison bundle from two completed analyses
    pub fn build(original: QueryAnalysis, optimized: QueryAnalysis) -> ComparisonResult {
        let improvements = compare(&original.metrics, &optimized.metrics);
        let plan_diff = Self::plan_diff(&original.metrics, &optimized.metrics);
        let row_count_match = original.metrics.row_count == optimized.metrics.row_count;
        let verdict = Self::verdict(improvements.execution_time_pct);

        if !row_count_match {
            tracing::warn!(
                "Row count mismatch: original returned {} rows, optimized returned {}",
                original.metrics.row_count,
                optimized.metrics.row_count
            );
        }

        ComparisonResult { original, optimized, improvements, plan_diff, row_count_match, verdict }
    }

    /// Node types added or removed, and sequential scan counts on each side
    pub fn plan_diff(original: &PlanMetrics, optimized: &PlanMetrics) -> PlanShapeDiff {
        let before: Vec<String> = original.node_type_stats.keys().cloned().collect();
        let after: Vec<String> = optimized.node_type_stats.keys().cloned().collect();
        let (added_node_types, removed_node_types) = diff_sets(&before, &after);

        let seq_scans = |m: &PlanMetrics| {
            m.node_type_stats
                .get(node_types::SEQ_SCAN)
                .map(|s| s.count)
                .unwrap_or(0)
        };

        PlanShapeDiff {
            added_node_types,
            removed_node_types,
            seq_scans_before: seq_scans(original),
            seq_scans_after: seq_scans(optimized),
        }
    }

    fn verdict(execution_time_pct: f64) -> Verdict {
        if execution_time_pct > 0.0 {
            Verdict::Improved
        } else if execution_time_pct < 0.0 {
            Verdict::Degraded
        } else {
            Verdict::NoChange
        }
    }
}
