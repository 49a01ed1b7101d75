//! Problem detector
//!
//! Walks the plan tree in pre-order and evaluates every registered rule
//! against every node. Problems keep traversal order.

use super::rules::{DiagnosticRule, RuleContext, get_all_rules};
use super::thresholds::AnalyzerThresholds;
use crate::services::plan_analyzer::models::{PlanNode, Problem};

/// Rule engine for plan diagnostics
pub struct ProblemDetector {
    thresholds: AnalyzerThresholds,
    rules: Vec<Box<dyn DiagnosticRule>>,
}

impl ProblemDetector {
    /// Create a detector with default thresholds
    pub fn new() -> Self {
        Self::with_thresholds(AnalyzerThresholds::default())
    }

    pub fn with_thresholds(thresholds: AnalyzerThresholds) -> Self {
        Self { thresholds, rules: get_all_rules() }
    }

    pub fn thresholds(&self) -> &AnalyzerThresholds {
        &self.thresholds
    }

    /// Detect problems in the tree rooted at `root`
    pub fn detect(&self, root: &PlanNode) -> Vec<Problem> {
        let mut problems = Vec::new();

        for node in root.iter() {
            let context = RuleContext::new(node, &self.thresholds);
            for rule in &self.rules {
                if !rule.applicable_to(node) {
                    continue;
                }
                if let Some(problem) = rule.evaluate(&context) {
                    tracing::debug!(
                        "Rule {} ({}) triggered on {}: {}",
                        rule.id(),
                        rule.name(),
                        node.node_type,
                        problem.description
                    );
                    problems.push(problem);
                }
            }
        }

        problems
    }
}

impl Default for ProblemDetector {
    fn default() -> Self {
        Self::new()
    }
}
