//! Plan analysis data models
//!
//! These models represent the structured data extracted from PostgreSQL
//! `EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON)` output. They are serializable so
//! the comparison bundle can be written out as a JSON report.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

// ============================================================================
// Plan Tree
// ============================================================================

/// A node in the execution plan tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanNode {
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub relation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alias: Option<String>,

    pub actual_rows: u64,
    pub planned_rows: u64,
    /// Inclusive of descendants, per iteration
    pub actual_time_ms: f64,
    pub startup_time_ms: f64,
    pub actual_loops: u64,
    pub total_cost: f64,
    pub startup_cost: f64,
    #[serde(default)]
    pub plan_width: u64,

    pub shared_hit_blocks: u64,
    pub shared_read_blocks: u64,
    pub shared_dirtied_blocks: u64,
    pub shared_written_blocks: u64,
    pub temp_read_blocks: u64,
    pub temp_written_blocks: u64,
    pub io_read_time_ms: f64,
    pub io_write_time_ms: f64,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub rows_removed_by_filter: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scan_direction: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub index_condition: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub join_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hash_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub merge_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub join_filter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sort_keys: Option<Vec<String>>,

    #[serde(default)]
    pub children: Vec<PlanNode>,
}

impl Default for PlanNode {
    fn default() -> Self {
        Self {
            node_type: String::new(),
            relation_name: None,
            schema: None,
            alias: None,
            actual_rows: 0,
            planned_rows: 0,
            actual_time_ms: 0.0,
            startup_time_ms: 0.0,
            actual_loops: 1,
            total_cost: 0.0,
            startup_cost: 0.0,
            plan_width: 0,
            shared_hit_blocks: 0,
            shared_read_blocks: 0,
            shared_dirtied_blocks: 0,
            shared_written_blocks: 0,
            temp_read_blocks: 0,
            temp_written_blocks: 0,
            io_read_time_ms: 0.0,
            io_write_time_ms: 0.0,
            filter: None,
            rows_removed_by_filter: 0,
            scan_direction: None,
            index_name: None,
            index_condition: None,
            join_type: None,
            hash_condition: None,
            merge_condition: None,
            join_filter: None,
            sort_keys: None,
            children: Vec::new(),
        }
    }
}

impl PlanNode {
    /// Create an otherwise empty node of the given type
    pub fn new(node_type: impl Into<String>) -> Self {
        Self { node_type: node_type.into(), ..Default::default() }
    }

    /// Pre-order iterator over this node and all of its descendants
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    pub fn is_seq_scan(&self) -> bool {
        self.node_type == constants::node_types::SEQ_SCAN
    }

    /// Index Scan, Index Only Scan, Bitmap Index Scan and Bitmap Heap Scan
    pub fn is_index_scan(&self) -> bool {
        self.node_type.contains("Index") || self.node_type.starts_with("Bitmap")
    }

    pub fn is_join(&self) -> bool {
        matches!(
            self.node_type.as_str(),
            constants::node_types::HASH_JOIN
                | constants::node_types::MERGE_JOIN
                | constants::node_types::NESTED_LOOP
        )
    }

    /// Sort and Incremental Sort
    pub fn is_sort(&self) -> bool {
        self.node_type.ends_with(constants::node_types::SORT)
    }

    /// Total number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }
}

/// Depth-first, parent-before-children traversal backed by an explicit stack
pub struct PreOrder<'a> {
    stack: Vec<&'a PlanNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Root node plus the query-level timings reported next to it
#[derive(Debug, Clone)]
pub struct ExplainSnapshot {
    pub root: PlanNode,
    pub planning_time_ms: f64,
    pub execution_time_ms: f64,
}

// ============================================================================
// Aggregated Metrics
// ============================================================================

/// Sums of the six buffer counters over the whole tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoTotals {
    pub shared_hit_blocks: u64,
    pub shared_read_blocks: u64,
    pub shared_dirtied_blocks: u64,
    pub shared_written_blocks: u64,
    pub temp_read_blocks: u64,
    pub temp_written_blocks: u64,
}

impl IoTotals {
    pub fn add_node(&mut self, node: &PlanNode) {
        // Clamp on overflow
        let add = |total: &mut u64, value: u64| *total = total.saturating_add(value);
        add(&mut self.shared_hit_blocks, node.shared_hit_blocks);
        add(&mut self.shared_read_blocks, node.shared_read_blocks);
        add(&mut self.shared_dirtied_blocks, node.shared_dirtied_blocks);
        add(&mut self.shared_written_blocks, node.shared_written_blocks);
        add(&mut self.temp_read_blocks, node.temp_read_blocks);
        add(&mut self.temp_written_blocks, node.temp_written_blocks);
    }
}

/// Shared buffer usage and cache hit rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferStats {
    pub hit: u64,
    pub read: u64,
    pub dirtied: u64,
    pub written: u64,
    /// Percentage in [0, 100]
    pub hit_rate: f64,
}

impl From<&IoTotals> for BufferStats {
    fn from(io: &IoTotals) -> Self {
        let accessed = io.shared_hit_blocks as f64 + io.shared_read_blocks as f64;
        let hit_rate = if accessed == 0.0 {
            0.0
        } else {
            io.shared_hit_blocks as f64 / accessed * 100.0
        };
        Self {
            hit: io.shared_hit_blocks,
            read: io.shared_read_blocks,
            dirtied: io.shared_dirtied_blocks,
            written: io.shared_written_blocks,
            hit_rate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeStats {
    pub count: u64,
    /// Sum of per-iteration node times, not multiplied by loops
    pub total_time_ms: f64,
    pub total_rows: u64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    pub scan_type: String,
    pub rows: u64,
    pub cost: f64,
    pub width: u64,
}

/// Metrics of one analyzed query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanMetrics {
    pub planning_time_ms: f64,
    pub execution_time_ms: f64,
    pub total_time_ms: f64,
    pub row_count: u64,
    pub rows_per_second: f64,
    pub root: PlanNode,
    pub io_totals: IoTotals,
    pub buffer_stats: BufferStats,
    pub node_type_stats: BTreeMap<String, NodeTypeStats>,
    pub table_stats: BTreeMap<String, TableStats>,
}

// ============================================================================
// Findings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// A performance problem found on one plan node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub rule_id: String,
    pub node_type: String,
    pub description: String,
    pub severity: Severity,
}

/// A candidate index on one table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexRecommendation {
    pub table: String,
    pub columns: Vec<String>,
    pub reason: String,
}

impl IndexRecommendation {
    pub fn description(&self) -> String {
        format!("Create index on {}({}) — {}", self.table, self.columns.join(", "), self.reason)
    }

    pub fn sql(&self) -> String {
        format!(
            "CREATE INDEX idx_{}_{} ON {} ({});",
            self.table,
            self.columns.join("_"),
            self.table,
            self.columns.join(", ")
        )
    }

    /// Identity used for de-duplication: table plus column set
    pub fn dedup_key(&self) -> (String, Vec<String>) {
        let mut columns = self.columns.clone();
        columns.sort();
        (self.table.clone(), columns)
    }
}

impl Serialize for IndexRecommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("IndexRecommendation", 5)?;
        state.serialize_field("table", &self.table)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("reason", &self.reason)?;
        state.serialize_field("description", &self.description())?;
        state.serialize_field("sql", &self.sql())?;
        state.end()
    }
}

/// Complete analysis of a single query plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub metrics: PlanMetrics,
    pub problems: Vec<Problem>,
    pub recommendations: Vec<IndexRecommendation>,
}

// ============================================================================
// Comparison
// ============================================================================

/// Relative change from original to optimized; positive means faster
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Improvements {
    pub execution_time_pct: f64,
    pub planning_time_pct: f64,
    pub execution_time_diff_ms: f64,
    pub planning_time_diff_ms: f64,
}

/// Operator-level shape change between the two plans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanShapeDiff {
    pub added_node_types: Vec<String>,
    pub removed_node_types: Vec<String>,
    pub seq_scans_before: u64,
    pub seq_scans_after: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Improved,
    NoChange,
    Degraded,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Improved => "IMPROVED",
            Verdict::NoChange => "NO CHANGE",
            Verdict::Degraded => "DEGRADED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub original: QueryAnalysis,
    pub optimized: QueryAnalysis,
    pub improvements: Improvements,
    pub plan_diff: PlanShapeDiff,
    pub row_count_match: bool,
    pub verdict: Verdict,
}

// ============================================================================
// Constants
// ============================================================================

pub mod constants {
    /// `Node Type` values the analyzer reasons about
    pub mod node_types {
        pub const SEQ_SCAN: &str = "Seq Scan";
        pub const SORT: &str = "Sort";
        pub const NESTED_LOOP: &str = "Nested Loop";
        pub const HASH_JOIN: &str = "Hash Join";
        pub const MERGE_JOIN: &str = "Merge Join";
        pub const HASH: &str = "Hash";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> PlanNode {
        let mut join = PlanNode::new("Hash Join");
        let scan = PlanNode::new("Seq Scan");
        let mut hash = PlanNode::new("Hash");
        hash.children.push(PlanNode::new("Index Scan"));
        join.children.push(scan);
        join.children.push(hash);
        join
    }

    #[test]
    fn test_pre_order_traversal() {
        let tree = sample_tree();
        let order: Vec<&str> = tree.iter().map(|n| n.node_type.as_str()).collect();
        assert_eq!(order, vec!["Hash Join", "Seq Scan", "Hash", "Index Scan"]);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_node_classification() {
        assert!(PlanNode::new("Seq Scan").is_seq_scan());
        assert!(PlanNode::new("Index Only Scan").is_index_scan());
        assert!(PlanNode::new("Bitmap Heap Scan").is_index_scan());
        assert!(!PlanNode::new("Seq Scan").is_index_scan());
        assert!(PlanNode::new("Incremental Sort").is_sort());
        assert!(PlanNode::new("Merge Join").is_join());
        assert!(!PlanNode::new("Hash").is_join());
    }

    #[test]
    fn test_default_loops_is_one() {
        assert_eq!(PlanNode::default().actual_loops, 1);
    }

    #[test]
    fn test_buffer_stats_hit_rate() {
        let io = IoTotals { shared_hit_blocks: 75, shared_read_blocks: 25, ..Default::default() };
        let stats = BufferStats::from(&io);
        assert!((stats.hit_rate - 75.0).abs() < 1e-9);

        let empty = BufferStats::from(&IoTotals::default());
        assert_eq!(empty.hit_rate, 0.0);
    }

    #[test]
    fn test_io_totals_saturate() {
        let node = PlanNode {
            shared_hit_blocks: u64::MAX - 1,
            shared_read_blocks: u64::MAX,
            temp_written_blocks: 7,
            ..PlanNode::new("Seq Scan")
        };
        let mut io = IoTotals::default();
        io.add_node(&node);
        io.add_node(&node);

        assert_eq!(io.shared_hit_blocks, u64::MAX);
        assert_eq!(io.shared_read_blocks, u64::MAX);
        assert_eq!(io.temp_written_blocks, 14);

        let stats = BufferStats::from(&io);
        assert!((0.0..=100.0).contains(&stats.hit_rate));
        assert!((stats.hit_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_index_recommendation_rendering() {
        let rec = IndexRecommendation {
            table: "orders".to_string(),
            columns: vec!["customer_id".to_string(), "status".to_string()],
            reason: "sequential scan with filter: (customer_id = 42)".to_string(),
        };
        assert_eq!(
            rec.sql(),
            "CREATE INDEX idx_orders_customer_id_status ON orders (customer_id, status);"
        );
        assert_eq!(
            rec.description(),
            "Create index on orders(customer_id, status) — sequential scan with filter: (customer_id = 42)"
        );

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["sql"], rec.sql());
        assert_eq!(json["columns"][1], "status");
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
        assert_eq!(Severity::Medium.to_string(), "MEDIUM");
        assert!(Severity::High > Severity::Low);
    }
}
