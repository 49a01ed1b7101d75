//! Cardinality estimate rules (E001)

use super::*;

/// E001: Planner row estimate far from the observed row count
/// Condition: planned_rows > 0 and actual/planned outside [low, high]
pub struct E001PoorRowEstimate;

impl DiagnosticRule for E001PoorRowEstimate {
    fn id(&self) -> &str {
        "E001"
    }

    fn name(&self) -> &str {
        "Poor row estimate"
    }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.planned_rows > 0
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Problem> {
        let planned = context.node.planned_rows;
        if planned == 0 {
            return None;
        }

        let actual = context.node.actual_rows;
        let ratio = actual as f64 / planned as f64;
        if !context.thresholds.is_poor_estimate(ratio) {
            return None;
        }

        Some(self.report(
            context,
            Severity::Medium,
            format!(
                "Poor row estimate: expected {} rows, got {} (ratio {:.1})",
                planned, actual, ratio
            ),
        ))
    }
}

pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(E001PoorRowEstimate)]
}
