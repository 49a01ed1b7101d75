//! Plan analyzer module
//!
//! Provides rule-based diagnostics, index advice and comparison of analyzed plans.

pub mod comparison;
pub mod index_advisor;
pub mod problem_detector;
pub mod rules;
pub mod thresholds;

pub use comparison::{ComparisonEngine, compare, improvement_pct};
pub use index_advisor::IndexAdvisor;
pub use problem_detector::ProblemDetector;
pub use thresholds::AnalyzerThresholds;
