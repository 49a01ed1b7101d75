//! Metrics aggregator
//!
//! Rolls a parsed plan tree up into query-level [`PlanMetrics`]: I/O totals,
//! buffer hit rate, per-node-type and per-table statistics.

use crate::services::plan_analyzer::models::constants::node_types;
use crate::services::plan_analyzer::models::{
    BufferStats, IoTotals, NodeTypeStats, PlanMetrics, PlanNode, TableStats,
};
use std::collections::BTreeMap;

pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Aggregate metrics for one query
    ///
    /// `row_count` is the number of rows the query returned and is unrelated to
    /// the per-node row counts.
    pub fn aggregate(
        root: PlanNode,
        row_count: u64,
        planning_time_ms: f64,
        execution_time_ms: f64,
    ) -> PlanMetrics {
        let mut io_totals = IoTotals::default();
        let mut node_type_stats: BTreeMap<String, NodeTypeStats> = BTreeMap::new();
        let mut table_stats: BTreeMap<String, TableStats> = BTreeMap::new();

        for node in root.iter() {
            io_totals.add_node(node);
            Self::accumulate_node_type(&mut node_type_stats, node);
            Self::accumulate_table(&mut table_stats, node);
        }

        let buffer_stats = BufferStats::from(&io_totals);
        let rows_per_second = if execution_time_ms > 0.0 {
            row_count as f64 / (execution_time_ms / 1000.0)
        } else {
            0.0
        };

        tracing::debug!(
            "Aggregated {} nodes: {} node types, {} tables, hit_rate={:.1}%",
            root.node_count(),
            node_type_stats.len(),
            table_stats.len(),
            buffer_stats.hit_rate
        );

        PlanMetrics {
            planning_time_ms,
            execution_time_ms,
            total_time_ms: planning_time_ms + execution_time_ms,
            row_count,
            rows_per_second,
            root,
            io_totals,
            buffer_stats,
            node_type_stats,
            table_stats,
        }
    }

    fn accumulate_node_type(stats: &mut BTreeMap<String, NodeTypeStats>, node: &PlanNode) {
        let entry = stats.entry(node.node_type.clone()).or_default();
        entry.count = entry.count.saturating_add(1);
        entry.total_time_ms += node.actual_time_ms;
        entry.total_rows = entry.total_rows.saturating_add(node.actual_rows);
        entry.total_cost += node.total_cost;
    }

    fn accumulate_table(stats: &mut BTreeMap<String, TableStats>, node: &PlanNode) {
        let Some(table) = &node.relation_name else {
            return;
        };

        match stats.get_mut(table) {
            Some(entry) => {
                entry.rows = entry.rows.saturating_add(node.actual_rows);
                entry.cost += node.total_cost;
                // A sequential scan is only ever replaced by an index-family scan
                if entry.scan_type == node_types::SEQ_SCAN && node.is_index_scan() {
                    entry.scan_type = node.node_type.clone();
                }
            },
            None => {
                stats.insert(
                    table.clone(),
                    TableStats {
                        scan_type: node.node_type.clone(),
                        rows: node.actual_rows,
                        cost: node.total_cost,
                        width: node.plan_width,
                    },
                );
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(node_type: &str, table: &str, rows: u64, cost: f64) -> PlanNode {
        PlanNode {
            node_type: node_type.to_string(),
            relation_name: Some(table.to_string()),
            actual_rows: rows,
            total_cost: cost,
            ..Default::default()
        }
    }

    #[test]
    fn test_io_totals_sum_every_node() {
        let mut root = PlanNode::new("Nested Loop");
        root.shared_hit_blocks = 1;
        root.temp_written_blocks = 2;
        let mut left = scan("Seq Scan", "a", 10, 1.0);
        left.shared_hit_blocks = 10;
        left.shared_read_blocks = 5;
        let mut right = scan("Index Scan", "b", 10, 1.0);
        right.shared_hit_blocks = 100;
        right.shared_dirtied_blocks = 3;
        root.children = vec![left, right];

        let metrics = MetricsAggregator::aggregate(root, 10, 0.1, 1.0);

        assert_eq!(metrics.io_totals.shared_hit_blocks, 111);
        assert_eq!(metrics.io_totals.shared_read_blocks, 5);
        assert_eq!(metrics.io_totals.shared_dirtied_blocks, 3);
        assert_eq!(metrics.io_totals.temp_written_blocks, 2);
        assert_eq!(metrics.buffer_stats.hit, 111);
        assert!((metrics.buffer_stats.hit_rate - 111.0 / 116.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_zero_without_buffer_access() {
        let metrics = MetricsAggregator::aggregate(PlanNode::new("Result"), 1, 0.0, 0.0);
        assert_eq!(metrics.buffer_stats.hit_rate, 0.0);
        assert_eq!(metrics.rows_per_second, 0.0);
    }

    #[test]
    fn test_extreme_counts_saturate() {
        let mut root = scan("Seq Scan", "a", u64::MAX, 1.0);
        root.shared_read_blocks = u64::MAX;
        let mut child = scan("Seq Scan", "a", u64::MAX, 1.0);
        child.shared_read_blocks = u64::MAX;
        root.children = vec![child];

        let metrics = MetricsAggregator::aggregate(root, 1, 0.0, 1.0);

        assert_eq!(metrics.io_totals.shared_read_blocks, u64::MAX);
        assert_eq!(metrics.node_type_stats["Seq Scan"].count, 2);
        assert_eq!(metrics.node_type_stats["Seq Scan"].total_rows, u64::MAX);
        assert_eq!(metrics.table_stats["a"].rows, u64::MAX);
        assert_eq!(metrics.buffer_stats.hit_rate, 0.0);
    }

    #[test]
    fn test_totals_and_throughput() {
        let metrics = MetricsAggregator::aggregate(PlanNode::new("Result"), 500, 0.5, 250.0);
        assert_eq!(metrics.total_time_ms, 250.5);
        assert!((metrics.rows_per_second - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_node_type_stats_do_not_multiply_loops() {
        let mut root = PlanNode::new("Nested Loop");
        let mut inner = scan("Index Scan", "b", 1, 0.5);
        inner.actual_loops = 1000;
        inner.actual_time_ms = 0.01;
        root.children = vec![scan("Seq Scan", "a", 1000, 20.0), inner];

        let metrics = MetricsAggregator::aggregate(root, 1000, 0.0, 15.0);
        let index = &metrics.node_type_stats["Index Scan"];

        assert_eq!(index.count, 1);
        assert!((index.total_time_ms - 0.01).abs() < 1e-12);
        assert_eq!(metrics.node_type_stats.len(), 3);
    }

    #[test]
    fn test_table_stats_index_scan_overrides_seq_scan() {
        let mut root = PlanNode::new("Append");
        root.children = vec![
            scan("Seq Scan", "orders", 100, 10.0),
            scan("Index Scan", "orders", 5, 2.0),
            scan("Seq Scan", "orders", 1, 1.0),
        ];

        let metrics = MetricsAggregator::aggregate(root, 0, 0.0, 0.0);
        let orders = &metrics.table_stats["orders"];

        assert_eq!(orders.scan_type, "Index Scan");
        assert_eq!(orders.rows, 106);
        assert!((orders.cost - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_table_stats_index_scan_never_downgraded() {
        let mut root = PlanNode::new("Append");
        root.children = vec![
            scan("Bitmap Heap Scan", "orders", 10, 1.0),
            scan("Seq Scan", "orders", 10, 1.0),
            scan("Index Only Scan", "orders", 10, 1.0),
        ];

        let metrics = MetricsAggregator::aggregate(root, 0, 0.0, 0.0);
        assert_eq!(metrics.table_stats["orders"].scan_type, "Bitmap Heap Scan");
    }

    #[test]
    fn test_table_stats_keep_first_width() {
        let mut first = scan("Seq Scan", "orders", 1, 1.0);
        first.plan_width = 40;
        let mut second = scan("Seq Scan", "orders", 1, 1.0);
        second.plan_width = 8;
        let mut root = PlanNode::new("Append");
        root.children = vec![first, second];

        let metrics = MetricsAggregator::aggregate(root, 0, 0.0, 0.0);
        assert_eq!(metrics.table_stats["orders"].width, 40);
    }
}
