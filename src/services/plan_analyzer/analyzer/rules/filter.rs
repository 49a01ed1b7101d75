//! Filter diagnostic rules (F001)

use super::*;

/// F001: Filter discards many rows
/// Condition: rows_removed_by_filter > rows_removed_by_filter threshold
pub struct F001RowsRemovedByFilter;

impl DiagnosticRule for F001RowsRemovedByFilter {
    fn id(&self) -> &str {
        "F001"
    }

    fn name(&self) -> &str {
        "Rows removed by filter"
    }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.rows_removed_by_filter > 0
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Problem> {
        let removed = context.node.rows_removed_by_filter;
        if removed <= context.thresholds.rows_removed_by_filter {
            return None;
        }

        let kept = context.node.actual_rows;
        let removal_pct = removed as f64 / (removed as f64 + kept as f64) * 100.0;
        Some(self.report(
            context,
            Severity::Medium,
            format!(
                "Large number of rows removed by filter: {} ({:.1}% of scanned rows)",
                removed, removal_pct
            ),
        ))
    }
}

pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(F001RowsRemovedByFilter)]
}
