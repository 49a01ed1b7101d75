//! Diagnostic rules module
//!
//! Implements the rules evaluated by the problem detector.
//! Rules are organized by the operator family they inspect.

pub mod common;
pub mod estimate;
pub mod filter;
pub mod join;
pub mod scan;
pub mod sort;

use super::thresholds::AnalyzerThresholds;
use crate::services::plan_analyzer::models::*;

// ============================================================================
// Rule Trait and Types
// ============================================================================

/// Context for rule evaluation
pub struct RuleContext<'a> {
    pub node: &'a PlanNode,
    pub thresholds: &'a AnalyzerThresholds,
}

impl<'a> RuleContext<'a> {
    pub fn new(node: &'a PlanNode, thresholds: &'a AnalyzerThresholds) -> Self {
        Self { node, thresholds }
    }

    /// Node time over all loops in ms
    pub fn total_time_ms(&self) -> f64 {
        self.node.actual_time_ms * self.node.actual_loops as f64
    }
}

/// Diagnostic rule trait
pub trait DiagnosticRule: Send + Sync {
    /// Rule ID (e.g., "S001", "J001")
    fn id(&self) -> &str;

    /// Rule name
    fn name(&self) -> &str;

    /// Check if rule applies to this node
    fn applicable_to(&self, node: &PlanNode) -> bool;

    /// Evaluate the rule and return a problem if triggered
    fn evaluate(&self, context: &RuleContext) -> Option<Problem>;

    /// Build a problem attributed to this rule and the context node
    fn report(&self, context: &RuleContext, severity: Severity, description: String) -> Problem {
        Problem {
            rule_id: self.id().to_string(),
            node_type: context.node.node_type.clone(),
            description,
            severity,
        }
    }
}

/// Get all rules in evaluation order
pub fn get_all_rules() -> Vec<Box<dyn DiagnosticRule>> {
    let mut rules: Vec<Box<dyn DiagnosticRule>> = Vec::new();

    // Scan rules (S001)
    rules.extend(scan::get_rules());

    // Estimate rules (E001)
    rules.extend(estimate::get_rules());

    // Sort rules (T001)
    rules.extend(sort::get_rules());

    // Join rules (J001, J002)
    rules.extend(join::get_rules());

    // Filter rules (F001)
    rules.extend(filter::get_rules());

    // Common rules (L001, I001)
    rules.extend(common::get_rules());

    rules
}
