//! Sort operator diagnostic rules (T001)

use super::*;

/// T001: Sort rows too large
/// Condition: Sort with actual_rows > sort_rows
pub struct T001ExpensiveSort;

impl DiagnosticRule for T001ExpensiveSort {
    fn id(&self) -> &str {
        "T001"
    }

    fn name(&self) -> &str {
        "Expensive sort"
    }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.node_type == constants::node_types::SORT
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Problem> {
        let rows = context.node.actual_rows;
        if rows <= context.thresholds.sort_rows {
            return None;
        }

        let mut description = format!("Expensive sort on {} rows", rows);
        if let Some(keys) = &context.node.sort_keys {
            description.push_str(&format!(" (keys: {})", keys.join(", ")));
        }
        Some(self.report(context, Severity::Medium, description))
    }
}

pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(T001ExpensiveSort)]
}
