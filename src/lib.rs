//! pg-qperf-compare Library
//!
//! Analyzes PostgreSQL `EXPLAIN ANALYZE` plans and compares an original query
//! with an optimized rewrite.

pub mod config;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use services::{
    ComparisonReport, ComparisonResult, FilePlanProvider, PlanAnalyzer, PlanProvider, PlanSnapshot,
    ProviderError, QueryAnalysis, summarize,
};
