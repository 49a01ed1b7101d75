//! Core parsing components for EXPLAIN plan analysis

pub mod condition_parser;
pub mod metrics_aggregator;
pub mod node_parser;

pub use condition_parser::{ColumnExtractor, HeuristicColumnExtractor};
pub use metrics_aggregator::MetricsAggregator;
pub use node_parser::PlanParser;
