//! Index recommendation engine
//!
//! Suggests candidate indexes from sequential scan filters, join conditions
//! and sort keys. Recommendations are advisory; condition text that cannot be
//! understood is ignored.

use super::thresholds::AnalyzerThresholds;
use crate::services::plan_analyzer::models::{IndexRecommendation, PlanNode};
use crate::services::plan_analyzer::parser::{ColumnExtractor, HeuristicColumnExtractor};
use crate::utils::{group_by_ordered, unique_ordered};
use std::collections::{HashMap, HashSet};

pub struct IndexAdvisor {
    thresholds: AnalyzerThresholds,
    extractor: Box<dyn ColumnExtractor>,
}

impl IndexAdvisor {
    pub fn new() -> Self {
        Self::with_thresholds(AnalyzerThresholds::default())
    }

    pub fn with_thresholds(thresholds: AnalyzerThresholds) -> Self {
        Self { thresholds, extractor: Box::new(HeuristicColumnExtractor::new()) }
    }

    /// Replace the condition text heuristic
    pub fn with_extractor(mut self, extractor: Box<dyn ColumnExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Recommend indexes for the tree rooted at `root`, de-duplicated by
    /// table and column set
    pub fn recommend(&self, root: &PlanNode) -> Vec<IndexRecommendation> {
        let mut recommendations = Vec::new();

        for node in root.iter() {
            if node.is_seq_scan() {
                self.recommend_for_seq_scan(node, &mut recommendations);
            }
            if node.is_join() {
                self.recommend_for_join(node, &mut recommendations);
            }
            if node.is_sort() {
                self.recommend_for_sort(node, &mut recommendations);
            }
        }

        Self::deduplicate(recommendations)
    }

    fn recommend_for_seq_scan(&self, node: &PlanNode, out: &mut Vec<IndexRecommendation>) {
        if node.actual_rows <= self.thresholds.index_candidate_rows {
            return;
        }
        let (Some(table), Some(filter)) = (&node.relation_name, &node.filter) else {
            return;
        };

        let columns = unique_ordered(self.extractor.columns(filter));
        if columns.is_empty() {
            tracing::debug!("No indexable columns in filter on {}: {}", table, filter);
            return;
        }

        out.push(IndexRecommendation {
            table: table.clone(),
            columns,
            reason: format!("sequential scan with filter: {}", filter),
        });
    }

    fn recommend_for_join(&self, node: &PlanNode, out: &mut Vec<IndexRecommendation>) {
        let aliases = Self::relation_aliases(node);
        let conditions = [
            ("Hash Cond", &node.hash_condition),
            ("Merge Cond", &node.merge_condition),
            ("Join Filter", &node.join_filter),
        ];

        for (label, condition) in conditions {
            let Some(condition) = condition else {
                continue;
            };

            // Group per join side before resolving, so a self-join keeps one
            // recommendation per alias
            let pairs = self.extractor.qualified_columns(condition);
            for (qualifier, pairs) in group_by_ordered(pairs, |p| p.0.clone()) {
                let table = aliases.get(&qualifier).cloned().unwrap_or(qualifier);
                let columns = unique_ordered(pairs.into_iter().map(|(_, c)| c).collect());
                out.push(IndexRecommendation {
                    table,
                    columns,
                    reason: format!("join condition ({}): {}", label, condition),
                });
            }
        }
    }

    fn recommend_for_sort(&self, node: &PlanNode, out: &mut Vec<IndexRecommendation>) {
        let Some(keys) = node.sort_keys.as_ref().filter(|k| !k.is_empty()) else {
            return;
        };
        // Unqualified keys go to the own relation, else the first descendant in pre-order
        let Some(default_table) = node.iter().find_map(|n| n.relation_name.as_ref()) else {
            return;
        };
        let aliases = Self::relation_aliases(node);

        let columns: Vec<(String, String)> = keys
            .iter()
            .filter_map(|k| {
                let column = self.extractor.sort_column(k)?;
                let table = self
                    .extractor
                    .sort_qualifier(k)
                    .and_then(|q| aliases.get(&q).cloned())
                    .unwrap_or_else(|| default_table.clone());
                Some((table, column))
            })
            .collect();

        for (table, columns) in group_by_ordered(columns, |c| c.0.clone()) {
            out.push(IndexRecommendation {
                table,
                columns: unique_ordered(columns.into_iter().map(|(_, c)| c).collect()),
                reason: format!("sort operation on columns: {}", keys.join(", ")),
            });
        }
    }

    /// Map of alias (and bare relation name) to relation name for the scans under `node`
    fn relation_aliases(node: &PlanNode) -> HashMap<String, String> {
        let mut aliases = HashMap::new();
        for scan in node.iter() {
            if let Some(relation) = &scan.relation_name {
                aliases.insert(relation.clone(), relation.clone());
                if let Some(alias) = &scan.alias {
                    aliases.insert(alias.clone(), relation.clone());
                }
            }
        }
        aliases
    }

    fn deduplicate(recommendations: Vec<IndexRecommendation>) -> Vec<IndexRecommendation> {
        let mut seen = HashSet::new();
        recommendations
            .into_iter()
            .filter(|rec| seen.insert(rec.dedup_key()))
            .collect()
    }
}

impl Default for IndexAdvisor {
    fn default() -> Self {
        Self::new()
    }
}
