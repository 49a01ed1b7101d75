//! Condition text parser
//!
//! Pulls column references out of the condition strings PostgreSQL prints in
//! `Filter`, `Hash Cond`, `Merge Cond`, `Join Filter` and `Sort Key`. This is a
//! best-effort text heuristic: fragments it does not understand are skipped.

use crate::utils::string_ext::{is_identifier, strip_wrapping};
use once_cell::sync::Lazy;
use regex::Regex;

/// Regex to split a condition into AND/OR clause fragments
static CLAUSE_SPLIT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:AND|OR)\s+").unwrap());

/// position(col IN pattern)
static POSITION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bposition\s*\(+\s*([^\s()]+?)\s+IN\s+").unwrap());

/// coalesce(col, fallback)
static COALESCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcoalesce\s*\(+\s*([^\s,()]+)\s*,").unwrap());

/// Comparison operators, longest alternatives first
static OPERATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(>=|<=|<>|!=|!~~\*?|~~\*?|=|>|<|\bNOT\s+I?LIKE\b|\bI?LIKE\b|\bNOT\s+IN\b|\bIN\b|\bIS\s+(?:NOT\s+)?NULL\b)",
    )
    .unwrap()
});

/// `table.column` or `schema.table.column`
static QUALIFIED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*){1,2}$").unwrap()
});

/// Extracts column references from condition text
pub trait ColumnExtractor: Send + Sync {
    /// Unqualified column names referenced by the condition, in order of appearance
    fn columns(&self, condition: &str) -> Vec<String>;

    /// `(qualifier, column)` pairs for every `table.column` operand
    fn qualified_columns(&self, condition: &str) -> Vec<(String, String)>;

    /// Column named by one sort key, e.g. `o.created_at DESC NULLS LAST`
    fn sort_column(&self, sort_key: &str) -> Option<String>;

    /// Table qualifier of one sort key, e.g. `o` for `o.created_at DESC`
    fn sort_qualifier(&self, _sort_key: &str) -> Option<String> {
        None
    }
}

/// Regex-driven extractor for PostgreSQL's deparsed condition syntax
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicColumnExtractor;

impl HeuristicColumnExtractor {
    pub fn new() -> Self {
        Self
    }

    fn fragments(condition: &str) -> impl Iterator<Item = &str> {
        CLAUSE_SPLIT_REGEX
            .split(condition)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn column_in_fragment(fragment: &str) -> Option<String> {
        if let Some(caps) = POSITION_REGEX.captures(fragment) {
            return normalize_column(&caps[1]);
        }
        if let Some(caps) = COALESCE_REGEX.captures(fragment) {
            return normalize_column(&caps[1]);
        }

        let op = OPERATOR_REGEX.find(fragment)?;
        let token = fragment[..op.start()].split_whitespace().next_back()?;
        normalize_column(token)
    }
}

impl ColumnExtractor for HeuristicColumnExtractor {
    fn columns(&self, condition: &str) -> Vec<String> {
        Self::fragments(condition)
            .filter_map(Self::column_in_fragment)
            .collect()
    }

    fn qualified_columns(&self, condition: &str) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for fragment in Self::fragments(condition) {
            let Some(op) = OPERATOR_REGEX.find(fragment) else {
                continue;
            };
            for side in [&fragment[..op.start()], &fragment[op.end()..]] {
                if let Some(pair) = qualified_pair(side) {
                    pairs.push(pair);
                }
            }
        }
        pairs
    }

    fn sort_column(&self, sort_key: &str) -> Option<String> {
        let token = sort_key.split_whitespace().next()?;
        normalize_column(token)
    }

    fn sort_qualifier(&self, sort_key: &str) -> Option<String> {
        let token = sort_key.split_whitespace().next()?;
        qualified_pair(token).map(|(table, _)| table)
    }
}

/// Remove casts and wrapping, then reduce to the last name segment
fn normalize_column(token: &str) -> Option<String> {
    let bare = strip_operand(token);
    let column = bare.rsplit('.').next().unwrap_or(bare).trim_matches('"');
    is_identifier(column).then(|| column.to_string())
}

fn qualified_pair(side: &str) -> Option<(String, String)> {
    let bare = strip_operand(side);
    if !QUALIFIED_REGEX.is_match(bare) {
        return None;
    }
    let mut segments = bare.rsplit('.');
    let column = segments.next()?;
    let table = segments.next()?;
    Some((table.to_string(), column.to_string()))
}

fn strip_operand(token: &str) -> &str {
    let token = strip_wrapping(token);
    let uncast = token.split("::").next().unwrap_or(token);
    strip_wrapping(uncast)
}
