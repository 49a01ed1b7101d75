//! Scan operator diagnostic rules (S001)

use super::*;

/// S001: Sequential scan producing a large result set
/// Condition: Seq Scan with actual_rows > seq_scan_rows
pub struct S001LargeSeqScan;

impl DiagnosticRule for S001LargeSeqScan {
    fn id(&self) -> &str {
        "S001"
    }

    fn name(&self) -> &str {
        "Large sequential scan"
    }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.is_seq_scan()
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Problem> {
        let rows = context.node.actual_rows;
        if rows <= context.thresholds.seq_scan_rows {
            return None;
        }

        let description = match &context.node.relation_name {
            Some(table) => {
                format!("Sequential scan on large result set: {} rows from {}", rows, table)
            },
            None => format!("Sequential scan on large result set: {} rows", rows),
        };
        Some(self.report(context, Severity::High, description))
    }
}

pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(S001LargeSeqScan)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_scan(rows: u64) -> PlanNode {
        PlanNode {
            node_type: "Seq Scan".to_string(),
            relation_name: Some("orders".to_string()),
            actual_rows: rows,
            ..Default::default()
        }
    }

    #[test]
    fn test_s001_triggers_above_threshold() {
        let node = seq_scan(5000);
        let thresholds = AnalyzerThresholds::default();
        let context = RuleContext::new(&node, &thresholds);

        let rule = S001LargeSeqScan;
        assert!(rule.applicable_to(&node));
        let problem = rule.evaluate(&context).unwrap();
        assert_eq!(problem.severity, Severity::High);
        assert_eq!(problem.rule_id, "S001");
        assert!(problem.description.contains("5000"));
        assert!(problem.description.contains("orders"));
    }

    #[test]
    fn test_s001_boundary_not_triggered() {
        let node = seq_scan(1000);
        let thresholds = AnalyzerThresholds::default();
        let context = RuleContext::new(&node, &thresholds);
        assert!(S001LargeSeqScan.evaluate(&context).is_none());
    }

    #[test]
    fn test_s001_not_applicable_to_index_scan() {
        let node = PlanNode { actual_rows: 5000, ..PlanNode::new("Index Scan") };
        assert!(!S001LargeSeqScan.applicable_to(&node));
    }
}
