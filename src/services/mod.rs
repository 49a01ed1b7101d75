pub mod plan_analyzer;
pub mod plan_provider;
pub mod report;

pub use plan_analyzer::{ComparisonResult, PlanAnalyzer, QueryAnalysis, summarize};
pub use plan_provider::{FilePlanProvider, PlanProvider, PlanSnapshot, ProviderError};
pub use report::ComparisonReport;
