//! Common diagnostic rules (L001, I001)
//!
//! Rules that apply to every operator type.

use super::*;
use crate::utils::format::format_duration_ms;

/// L001: Node re-executed many times
/// Condition: actual_loops > max_loops
pub struct L001ExcessiveLoops;

impl DiagnosticRule for L001ExcessiveLoops {
    fn id(&self) -> &str {
        "L001"
    }

    fn name(&self) -> &str {
        "Excessive loops"
    }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.actual_loops > 1
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Problem> {
        let loops = context.node.actual_loops;
        if loops <= context.thresholds.max_loops {
            return None;
        }

        Some(self.report(
            context,
            Severity::Medium,
            format!(
                "Node executed {} times ({} total)",
                loops,
                format_duration_ms(context.total_time_ms())
            ),
        ))
    }
}

/// I001: Node time dominated by I/O
/// Condition: total time > io_bound_min_time_ms and (read + write) / total > io_bound_ratio
pub struct I001IoBound;

impl DiagnosticRule for I001IoBound {
    fn id(&self) -> &str {
        "I001"
    }

    fn name(&self) -> &str {
        "I/O bound node"
    }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.io_read_time_ms + node.io_write_time_ms > 0.0
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Problem> {
        // I/O timings are reported over all loops
        let total_ms = context.total_time_ms();
        if total_ms <= context.thresholds.io_bound_min_time_ms {
            return None;
        }

        let io_ms = context.node.io_read_time_ms + context.node.io_write_time_ms;
        let ratio = io_ms / total_ms;
        if ratio <= context.thresholds.io_bound_ratio {
            return None;
        }

        Some(self.report(
            context,
            Severity::High,
            format!(
                "High I/O time: {} of {} ({:.1}%) spent reading or writing blocks",
                format_duration_ms(io_ms),
                format_duration_ms(total_ms),
                ratio * 100.0
            ),
        ))
    }
}

pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(L001ExcessiveLoops), Box::new(I001IoBound)]
}
