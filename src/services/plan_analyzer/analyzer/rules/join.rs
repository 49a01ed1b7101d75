//! Join operator diagnostic rules (J001-J002)

use super::*;
use crate::utils::format::format_blocks;

/// J001: Nested loop with large output
/// Condition: Nested Loop with actual_rows > nested_loop_rows
pub struct J001LargeNestedLoop;

impl DiagnosticRule for J001LargeNestedLoop {
    fn id(&self) -> &str {
        "J001"
    }

    fn name(&self) -> &str {
        "Large nested loop join"
    }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.node_type == constants::node_types::NESTED_LOOP
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Problem> {
        let rows = context.node.actual_rows;
        if rows <= context.thresholds.nested_loop_rows {
            return None;
        }

        Some(self.report(
            context,
            Severity::High,
            format!("Nested loop join with large row count: {} rows", rows),
        ))
    }
}

/// J002: Hash table spilled to disk
/// Condition: Hash Join / Hash with temp_written_blocks > 0
pub struct J002HashSpill;

impl DiagnosticRule for J002HashSpill {
    fn id(&self) -> &str {
        "J002"
    }

    fn name(&self) -> &str {
        "Hash spilled to disk"
    }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.node_type == constants::node_types::HASH_JOIN
            || node.node_type == constants::node_types::HASH
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Problem> {
        let blocks = context.node.temp_written_blocks;
        if blocks == 0 {
            return None;
        }

        Some(self.report(
            context,
            Severity::High,
            format!(
                "Hash spilled {} to disk ({} temp blocks written); consider raising work_mem",
                format_blocks(blocks),
                blocks
            ),
        ))
    }
}

pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(J001LargeNestedLoop), Box::new(J002HashSpill)]
}
