//! PostgreSQL Plan Analyzer
//!
//! Parses `EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON)` output, detects performance
//! problems, recommends indexes and compares an original query with an
//! optimized rewrite.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      PlanAnalyzer                        │
//! │                                                          │
//! │   EXPLAIN JSON ──► PlanParser ──► PlanNode tree          │
//! │                                      │                   │
//! │                               MetricsAggregator          │
//! │                                      │                   │
//! │                     ┌────────────────┴───────┐           │
//! │                     ▼                        ▼           │
//! │              ProblemDetector           IndexAdvisor      │
//! │                     └───────────┬────────────┘           │
//! │                                 ▼                        │
//! │                       QueryAnalysis (x2)                 │
//! │                                 │                        │
//! │                                 ▼                        │
//! │                         ComparisonEngine                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use pg_qperf_compare::services::plan_analyzer::PlanAnalyzer;
//!
//! let analyzer = PlanAnalyzer::default();
//! let original = analyzer.analyze(&original_explain, None)?;
//! let optimized = analyzer.analyze(&optimized_explain, None)?;
//! let result = analyzer.compare(original, optimized);
//! println!("{}", result.improvements.execution_time_pct);
//! ```

pub mod analyzer;
pub mod models;
pub mod parser;

#[cfg(test)]
mod tests;

pub use analyzer::{AnalyzerThresholds, ComparisonEngine, IndexAdvisor, ProblemDetector};
pub use models::*;
pub use parser::{MetricsAggregator, ParseError, ParseResult, PlanParser};

use crate::utils::format::{format_blocks, format_duration_ms};
use serde_json::Value;

/// Runs the full single-plan pipeline: parse, aggregate, detect, recommend
pub struct PlanAnalyzer {
    detector: ProblemDetector,
    advisor: IndexAdvisor,
}

impl PlanAnalyzer {
    pub fn new(thresholds: AnalyzerThresholds) -> Self {
        Self {
            detector: ProblemDetector::with_thresholds(thresholds.clone()),
            advisor: IndexAdvisor::with_thresholds(thresholds),
        }
    }

    /// Analyze one EXPLAIN document
    ///
    /// `row_count` is the number of rows the query returned; when unknown the
    /// root node's actual row count is used instead.
    pub fn analyze(&self, explain: &Value, row_count: Option<u64>) -> ParseResult<QueryAnalysis> {
        let snapshot = PlanParser::parse_explain(explain)?;
        Ok(self.analyze_snapshot(snapshot, row_count))
    }

    /// Analyze an already parsed plan
    pub fn analyze_snapshot(&self, snapshot: ExplainSnapshot, row_count: Option<u64>) -> QueryAnalysis {
        let row_count = row_count.unwrap_or(snapshot.root.actual_rows);
        let metrics = MetricsAggregator::aggregate(
            snapshot.root,
            row_count,
            snapshot.planning_time_ms,
            snapshot.execution_time_ms,
        );

        let problems = self.detector.detect(&metrics.root);
        let recommendations = self.advisor.recommend(&metrics.root);

        tracing::debug!(
            "Analyzed plan: {} nodes, {} problems, {} index recommendations",
            metrics.root.node_count(),
            problems.len(),
            recommendations.len()
        );

        QueryAnalysis { metrics, problems, recommendations }
    }

    /// Combine two analyses into a comparison
    pub fn compare(&self, original: QueryAnalysis, optimized: QueryAnalysis) -> ComparisonResult {
        ComparisonEngine::build(original, optimized)
    }
}

impl Default for PlanAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerThresholds::default())
    }
}

/// One-paragraph, human-readable summary of a comparison
pub fn summarize(name: &str, result: &ComparisonResult) -> String {
    let before = &result.original.metrics;
    let after = &result.optimized.metrics;
    let high_problems = |a: &QueryAnalysis| {
        a.problems.iter().filter(|p| p.severity == Severity::High).count()
    };

    format!(
        "[{}] {}: execution {} -> {} ({:+.1}%), planning {} -> {} ({:+.1}%), rows {} -> {} ({}), \
         seq scans {} -> {}, temp written {} -> {}, problems {} ({} high) -> {} ({} high), \
         index recommendations {}",
        name,
        result.verdict,
        format_duration_ms(before.execution_time_ms),
        format_duration_ms(after.execution_time_ms),
        result.improvements.execution_time_pct,
        format_duration_ms(before.planning_time_ms),
        format_duration_ms(after.planning_time_ms),
        result.improvements.planning_time_pct,
        before.row_count,
        after.row_count,
        if result.row_count_match { "MATCH" } else { "MISMATCH" },
        result.plan_diff.seq_scans_before,
        result.plan_diff.seq_scans_after,
        format_blocks(before.io_totals.temp_written_blocks),
        format_blocks(after.io_totals.temp_written_blocks),
        result.original.problems.len(),
        high_problems(&result.original),
        result.optimized.problems.len(),
        high_problems(&result.optimized),
        result.optimized.recommendations.len(),
    )
}
