//! Plan node parser
//!
//! Converts the raw EXPLAIN JSON tree into [`PlanNode`]s. Optional fields fall
//! back to defaults; only structural problems are reported as errors.

use crate::services::plan_analyzer::models::{ExplainSnapshot, PlanNode};
use crate::services::plan_analyzer::parser::error::{ParseError, ParseResult};
use crate::utils::StringExt;
use serde_json::{Map, Value};

/// Raw keys of the PostgreSQL JSON plan format
pub mod keys {
    pub const PLAN: &str = "Plan";
    pub const PLANS: &str = "Plans";
    pub const PLANNING_TIME: &str = "Planning Time";
    pub const EXECUTION_TIME: &str = "Execution Time";

    pub const NODE_TYPE: &str = "Node Type";
    pub const RELATION_NAME: &str = "Relation Name";
    pub const SCHEMA: &str = "Schema";
    pub const ALIAS: &str = "Alias";
    pub const ACTUAL_ROWS: &str = "Actual Rows";
    pub const PLAN_ROWS: &str = "Plan Rows";
    pub const ACTUAL_TOTAL_TIME: &str = "Actual Total Time";
    pub const ACTUAL_STARTUP_TIME: &str = "Actual Startup Time";
    pub const ACTUAL_LOOPS: &str = "Actual Loops";
    pub const TOTAL_COST: &str = "Total Cost";
    pub const STARTUP_COST: &str = "Startup Cost";
    pub const PLAN_WIDTH: &str = "Plan Width";

    pub const SHARED_HIT_BLOCKS: &str = "Shared Hit Blocks";
    pub const SHARED_READ_BLOCKS: &str = "Shared Read Blocks";
    pub const SHARED_DIRTIED_BLOCKS: &str = "Shared Dirtied Blocks";
    pub const SHARED_WRITTEN_BLOCKS: &str = "Shared Written Blocks";
    pub const TEMP_READ_BLOCKS: &str = "Temp Read Blocks";
    pub const TEMP_WRITTEN_BLOCKS: &str = "Temp Written Blocks";
    pub const IO_READ_TIME: &str = "I/O Read Time";
    pub const IO_WRITE_TIME: &str = "I/O Write Time";
    // PostgreSQL 16+ splits I/O timing per buffer kind
    pub const SHARED_IO_READ_TIME: &str = "Shared I/O Read Time";
    pub const SHARED_IO_WRITE_TIME: &str = "Shared I/O Write Time";

    pub const FILTER: &str = "Filter";
    pub const ROWS_REMOVED_BY_FILTER: &str = "Rows Removed by Filter";
    pub const SCAN_DIRECTION: &str = "Scan Direction";
    pub const INDEX_NAME: &str = "Index Name";
    pub const INDEX_COND: &str = "Index Cond";
    pub const JOIN_TYPE: &str = "Join Type";
    pub const HASH_COND: &str = "Hash Cond";
    pub const MERGE_COND: &str = "Merge Cond";
    pub const JOIN_FILTER: &str = "Join Filter";
    pub const SORT_KEY: &str = "Sort Key";
}

/// Parser for EXPLAIN (FORMAT JSON) documents
pub struct PlanParser;

impl PlanParser {
    /// Parse EXPLAIN output given as text
    pub fn parse_str(text: &str) -> ParseResult<ExplainSnapshot> {
        let value: Value = serde_json::from_str(text)?;
        Self::parse_explain(&value)
    }

    /// Parse a whole EXPLAIN document
    ///
    /// Accepts both the top-level array PostgreSQL prints and the bare object
    /// inside it.
    pub fn parse_explain(document: &Value) -> ParseResult<ExplainSnapshot> {
        let top = match document {
            Value::Array(items) => items
                .first()
                .ok_or_else(|| ParseError::malformed("$", "empty EXPLAIN array"))?,
            other => other,
        };
        let top = top
            .as_object()
            .ok_or_else(|| ParseError::malformed("$", "expected an object with a \"Plan\" key"))?;

        let raw_root = top
            .get(keys::PLAN)
            .ok_or_else(|| ParseError::malformed("$", "missing \"Plan\""))?;
        let root = Self::extract_at(raw_root, keys::PLAN)?;

        let planning_time_ms = Self::timing(top, keys::PLANNING_TIME);
        let execution_time_ms = Self::timing(top, keys::EXECUTION_TIME);

        Ok(ExplainSnapshot { root, planning_time_ms, execution_time_ms })
    }

    /// Convert one raw plan node (and its subtree) into a [`PlanNode`]
    pub fn extract(raw_node: &Value) -> ParseResult<PlanNode> {
        Self::extract_at(raw_node, keys::PLAN)
    }

    fn extract_at(raw_node: &Value, path: &str) -> ParseResult<PlanNode> {
        let obj = raw_node
            .as_object()
            .ok_or_else(|| ParseError::malformed(path, "plan node is not an object"))?;

        let node_type = match obj.get(keys::NODE_TYPE) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(ParseError::malformed(path, "\"Node Type\" is not a string"));
            },
            None => return Err(ParseError::malformed(path, "missing \"Node Type\"")),
        };

        let children = match obj.get(keys::PLANS) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, child)| Self::extract_at(child, &format!("{}.Plans[{}]", path, i)))
                .collect::<ParseResult<Vec<_>>>()?,
            Some(_) => return Err(ParseError::malformed(path, "\"Plans\" is not an array")),
        };

        Ok(PlanNode {
            node_type,
            relation_name: text(obj, keys::RELATION_NAME),
            schema: text(obj, keys::SCHEMA),
            alias: text(obj, keys::ALIAS),
            actual_rows: count(obj, keys::ACTUAL_ROWS),
            planned_rows: count(obj, keys::PLAN_ROWS),
            actual_time_ms: float(obj, keys::ACTUAL_TOTAL_TIME),
            startup_time_ms: float(obj, keys::ACTUAL_STARTUP_TIME),
            actual_loops: count(obj, keys::ACTUAL_LOOPS).max(1),
            total_cost: float(obj, keys::TOTAL_COST),
            startup_cost: float(obj, keys::STARTUP_COST),
            plan_width: count(obj, keys::PLAN_WIDTH),
            shared_hit_blocks: count(obj, keys::SHARED_HIT_BLOCKS),
            shared_read_blocks: count(obj, keys::SHARED_READ_BLOCKS),
            shared_dirtied_blocks: count(obj, keys::SHARED_DIRTIED_BLOCKS),
            shared_written_blocks: count(obj, keys::SHARED_WRITTEN_BLOCKS),
            temp_read_blocks: count(obj, keys::TEMP_READ_BLOCKS),
            temp_written_blocks: count(obj, keys::TEMP_WRITTEN_BLOCKS),
            io_read_time_ms: float_or(obj, keys::IO_READ_TIME, keys::SHARED_IO_READ_TIME),
            io_write_time_ms: float_or(obj, keys::IO_WRITE_TIME, keys::SHARED_IO_WRITE_TIME),
            filter: text(obj, keys::FILTER),
            rows_removed_by_filter: count(obj, keys::ROWS_REMOVED_BY_FILTER),
            scan_direction: text(obj, keys::SCAN_DIRECTION),
            index_name: text(obj, keys::INDEX_NAME),
            index_condition: text(obj, keys::INDEX_COND),
            join_type: text(obj, keys::JOIN_TYPE),
            hash_condition: text(obj, keys::HASH_COND),
            merge_condition: text(obj, keys::MERGE_COND),
            join_filter: text(obj, keys::JOIN_FILTER),
            sort_keys: sort_keys(obj),
            children,
        })
    }

    fn timing(top: &Map<String, Value>, key: &str) -> f64 {
        match top.get(key).and_then(Value::as_f64) {
            Some(ms) if ms >= 0.0 => ms,
            _ => {
                tracing::warn!("EXPLAIN output has no usable \"{}\", assuming 0", key);
                0.0
            },
        }
    }
}

/// Non-negative integer field; fractional values are rounded, anything else is 0
fn count(obj: &Map<String, Value>, key: &str) -> u64 {
    match obj.get(key) {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        None => 0,
    }
}

fn float(obj: &Map<String, Value>, key: &str) -> f64 {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|f| *f >= 0.0)
        .unwrap_or(0.0)
}

fn float_or(obj: &Map<String, Value>, key: &str, fallback: &str) -> f64 {
    if obj.contains_key(key) { float(obj, key) } else { float(obj, fallback) }
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).and_then(|s| s.clean())
}

fn sort_keys(obj: &Map<String, Value>) -> Option<Vec<String>> {
    let keys: Vec<String> = match obj.get(keys::SORT_KEY)? {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|s| s.clean())
            .collect(),
        Value::String(s) => s.clean().into_iter().collect(),
        _ => Vec::new(),
    };
    if keys.is_empty() { None } else { Some(keys) }
}
