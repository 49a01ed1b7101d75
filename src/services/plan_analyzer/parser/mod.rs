//! Plan parser module
//!
//! Provides parsing capabilities for PostgreSQL EXPLAIN (FORMAT JSON) output.

pub mod core;
pub mod error;

// Re-export commonly used items
pub use self::core::{ColumnExtractor, HeuristicColumnExtractor, MetricsAggregator, PlanParser};
pub use error::{ParseError, ParseResult};
pub use self::core::node_parser::keys as node_keys;
