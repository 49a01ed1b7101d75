//! Fixture driven tests for the plan analyzer
//!
//! Plans under tests/fixtures/plans/ are EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON)
//! captures of an orders/customers query before and after adding an index.

#[cfg(test)]
mod plan_tests {
    use crate::services::plan_analyzer::models::*;
    use crate::services::plan_analyzer::parser::core::*;
    use crate::services::plan_analyzer::{
        AnalyzerThresholds, ParseError, PlanAnalyzer, ProblemDetector, summarize,
    };
    use crate::services::plan_provider::PlanSnapshot;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;

    /// Get the path to test fixtures
    fn get_fixture_path(filename: &str) -> PathBuf {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests/fixtures/plans");
        path.push(filename);
        path
    }

    /// Load a plan fixture as a snapshot (raw EXPLAIN or wrapper)
    fn load_plan(filename: &str) -> PlanSnapshot {
        let path = get_fixture_path(filename);
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", path.display(), e));
        let value: Value = serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Invalid JSON in fixture {}: {}", path.display(), e));
        PlanSnapshot::from_value(value)
    }

    fn analyze_fixture(filename: &str) -> QueryAnalysis {
        let snapshot = load_plan(filename);
        PlanAnalyzer::default()
            .analyze(&snapshot.explain, snapshot.effective_row_count())
            .unwrap()
    }

    /// Sum of a field over every object carrying `Node Type` in the raw JSON
    fn raw_sum(value: &Value, key: &str) -> f64 {
        match value {
            Value::Object(map) => {
                let own = if map.contains_key("Node Type") {
                    map.get(key).and_then(Value::as_f64).unwrap_or(0.0)
                } else {
                    0.0
                };
                own + map.values().map(|v| raw_sum(v, key)).sum::<f64>()
            },
            Value::Array(items) => items.iter().map(|v| raw_sum(v, key)).sum(),
            _ => 0.0,
        }
    }

    mod parser_tests {
        use super::*;

        #[test]
        fn test_parse_original_tree_shape() {
            let snapshot = PlanParser::parse_explain(&load_plan("orders_original.json").explain)
                .unwrap();

            assert_eq!(snapshot.root.node_type, "Hash Join");
            assert_eq!(snapshot.root.node_count(), 4);
            assert_eq!(snapshot.planning_time_ms, 0.8);
            assert_eq!(snapshot.execution_time_ms, 152.9);

            let scan = &snapshot.root.children[0];
            assert_eq!(scan.relation_name.as_deref(), Some("orders"));
            assert_eq!(scan.schema.as_deref(), Some("public"));
            assert_eq!(scan.alias.as_deref(), Some("o"));
            assert_eq!(scan.filter.as_deref(), Some("(status = 'open'::text)"));
            assert_eq!(scan.rows_removed_by_filter, 400000);
            assert_eq!(scan.io_read_time_ms, 40.118);
        }

        #[test]
        fn test_parse_wrapped_snapshot() {
            let snapshot = load_plan("orders_optimized.json");
            assert_eq!(snapshot.row_count, Some(50));

            let parsed = PlanParser::parse_explain(&snapshot.explain).unwrap();
            let inner = &parsed.root.children[1];
            assert_eq!(inner.index_name.as_deref(), Some("customers_pkey"));
            assert_eq!(inner.actual_loops, 50);
            assert_eq!(inner.scan_direction.as_deref(), Some("Forward"));
        }

        #[test]
        fn test_sort_keys_extracted() {
            let parsed = PlanParser::parse_explain(&load_plan("sort_spill.json").explain).unwrap();
            assert_eq!(
                parsed.root.sort_keys,
                Some(vec!["o.created_at DESC".to_string(), "o.id".to_string()])
            );
        }

        #[test]
        fn test_extract_resums_match_raw_json() {
            for fixture in ["orders_original.json", "orders_optimized.json", "sort_spill.json"] {
                let raw = load_plan(fixture).explain;
                let parsed = PlanParser::parse_explain(&raw).unwrap();

                let rows: u64 = parsed.root.iter().map(|n| n.actual_rows).sum();
                let cost: f64 = parsed.root.iter().map(|n| n.total_cost).sum();

                assert_eq!(rows as f64, raw_sum(&raw, "Actual Rows"), "{}", fixture);
                assert!((cost - raw_sum(&raw, "Total Cost")).abs() < 1e-6, "{}", fixture);
            }
        }

        #[test]
        fn test_malformed_child_reports_path() {
            let err = PlanParser::parse_explain(&load_plan("malformed.json").explain).unwrap_err();
            match err {
                ParseError::MalformedPlan { path, reason } => {
                    assert_eq!(path, "Plan.Plans[0]");
                    assert!(reason.contains("Node Type"));
                },
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    mod metrics_tests {
        use super::*;

        #[test]
        fn test_io_totals_match_reference_traversal() {
            let analysis = analyze_fixture("sort_spill.json");
            let metrics = &analysis.metrics;

            // Independent recursive traversal
            fn reference(node: &PlanNode, io: &mut IoTotals) {
                io.shared_hit_blocks += node.shared_hit_blocks;
                io.shared_read_blocks += node.shared_read_blocks;
                io.shared_dirtied_blocks += node.shared_dirtied_blocks;
                io.shared_written_blocks += node.shared_written_blocks;
                io.temp_read_blocks += node.temp_read_blocks;
                io.temp_written_blocks += node.temp_written_blocks;
                for child in &node.children {
                    reference(child, io);
                }
            }
            let mut expected = IoTotals::default();
            reference(&metrics.root, &mut expected);

            assert_eq!(metrics.io_totals, expected);
            assert_eq!(metrics.io_totals.temp_written_blocks, 732);
        }

        #[test]
        fn test_buffer_hit_rate() {
            let metrics = analyze_fixture("orders_original.json").metrics;
            assert_eq!(metrics.buffer_stats.hit, 260);
            assert_eq!(metrics.buffer_stats.read, 1820);
            assert!((metrics.buffer_stats.hit_rate - 12.5).abs() < 1e-9);
            assert!((0.0..=100.0).contains(&metrics.buffer_stats.hit_rate));
        }

        #[test]
        fn test_node_type_counts() {
            let metrics = analyze_fixture("sort_spill.json").metrics;

            let mut expected: BTreeMap<String, u64> = BTreeMap::new();
            for node in metrics.root.iter() {
                *expected.entry(node.node_type.clone()).or_default() += 1;
            }
            let counts: BTreeMap<String, u64> = metrics
                .node_type_stats
                .iter()
                .map(|(k, v)| (k.clone(), v.count))
                .collect();

            assert_eq!(counts, expected);
            assert_eq!(counts["Seq Scan"], 2);
        }

        #[test]
        fn test_table_stats_upgrade_to_index_scan() {
            let metrics = analyze_fixture("orders_optimized.json").metrics;
            assert_eq!(metrics.table_stats["orders"].scan_type, "Index Scan");
            assert_eq!(metrics.table_stats["customers"].rows, 1);
            assert_eq!(metrics.row_count, 50);
        }
    }

    mod diagnostics_tests {
        use super::*;

        #[test]
        fn test_end_to_end_original_plan() {
            let analysis = analyze_fixture("orders_original.json");

            let rule_ids: Vec<&str> = analysis.problems.iter().map(|p| p.rule_id.as_str()).collect();
            assert_eq!(rule_ids, vec!["S001", "F001"]);

            let seq_scan = &analysis.problems[0];
            assert_eq!(seq_scan.severity, Severity::High);
            assert_eq!(seq_scan.node_type, "Seq Scan");
            assert!(seq_scan.description.contains("orders"));
            assert!(analysis.problems[1].description.contains("80.0%"));

            let recs: Vec<(&str, Vec<&str>)> = analysis
                .recommendations
                .iter()
                .map(|r| (r.table.as_str(), r.columns.iter().map(String::as_str).collect()))
                .collect();
            assert_eq!(recs.len(), 3);
            assert!(recs.contains(&("orders", vec!["status"])));
            assert!(recs.contains(&("orders", vec!["customer_id"])));
            assert!(recs.contains(&("customers", vec!["id"])));
        }

        #[test]
        fn test_minimal_end_to_end_tree() {
            let explain = json!([{
                "Plan": {
                    "Node Type": "Hash Join",
                    "Actual Rows": 50,
                    "Plans": [
                        {
                            "Node Type": "Seq Scan",
                            "Relation Name": "orders",
                            "Actual Rows": 100000,
                            "Filter": "status = 'open'"
                        },
                        { "Node Type": "Hash", "Actual Rows": 10 }
                    ]
                },
                "Planning Time": 0.5,
                "Execution Time": 120.0
            }]);

            let analysis = PlanAnalyzer::default().analyze(&explain, None).unwrap();

            let high: Vec<&Problem> =
                analysis.problems.iter().filter(|p| p.severity == Severity::High).collect();
            assert_eq!(high.len(), 1);
            assert_eq!(high[0].node_type, "Seq Scan");
            assert!(high[0].description.contains("orders"));

            assert_eq!(analysis.recommendations.len(), 1);
            assert_eq!(analysis.recommendations[0].table, "orders");
            assert_eq!(analysis.recommendations[0].columns, vec!["status"]);
            assert_eq!(
                analysis.recommendations[0].sql(),
                "CREATE INDEX idx_orders_status ON orders (status);"
            );
        }

        #[test]
        fn test_sort_and_spill_problems() {
            let analysis = analyze_fixture("sort_spill.json");

            let rule_ids: Vec<&str> = analysis.problems.iter().map(|p| p.rule_id.as_str()).collect();
            assert_eq!(rule_ids, vec!["E001", "T001", "E001", "J002", "S001", "S001"]);

            let sort_rec = analysis
                .recommendations
                .iter()
                .find(|r| r.reason.starts_with("sort operation"))
                .unwrap();
            assert_eq!(sort_rec.table, "orders");
            assert_eq!(sort_rec.columns, vec!["created_at", "id"]);
        }

        #[test]
        fn test_custom_thresholds_silence_rules() {
            let thresholds = AnalyzerThresholds {
                seq_scan_rows: 1_000_000,
                rows_removed_by_filter: 1_000_000,
                ..AnalyzerThresholds::default()
            };
            let root = PlanParser::parse_explain(&load_plan("orders_original.json").explain)
                .unwrap()
                .root;

            assert!(ProblemDetector::with_thresholds(thresholds).detect(&root).is_empty());
        }

        #[test]
        fn test_optimized_plan_is_clean() {
            let analysis = analyze_fixture("orders_optimized.json");
            assert!(analysis.problems.is_empty());
            assert!(analysis.recommendations.is_empty());
        }
    }

    mod comparison_tests {
        use super::*;

        #[test]
        fn test_compare_original_and_optimized() {
            let analyzer = PlanAnalyzer::default();
            let original = analyze_fixture("orders_original.json");
            let optimized = analyze_fixture("orders_optimized.json");
            let result = analyzer.compare(original, optimized);

            assert_eq!(result.verdict, Verdict::Improved);
            assert!(result.row_count_match);
            let expected = (152.9 - 2.1) / 152.9 * 100.0;
            assert!((result.improvements.execution_time_pct - expected).abs() < 1e-9);
            assert!(result.improvements.planning_time_pct < 0.0);

            assert_eq!(result.plan_diff.added_node_types, vec!["Index Scan", "Nested Loop"]);
            assert_eq!(result.plan_diff.removed_node_types, vec!["Hash", "Hash Join", "Seq Scan"]);
            assert_eq!(result.plan_diff.seq_scans_before, 2);
            assert_eq!(result.plan_diff.seq_scans_after, 0);
        }

        #[test]
        fn test_summary_line() {
            let analyzer = PlanAnalyzer::default();
            let result = analyzer.compare(
                analyze_fixture("orders_original.json"),
                analyze_fixture("orders_optimized.json"),
            );
            let summary = summarize("orders_by_status", &result);

            assert!(summary.starts_with("[orders_by_status] IMPROVED"));
            assert!(summary.contains("rows 50 -> 50 (MATCH)"));
            assert!(summary.contains("seq scans 2 -> 0"));
            assert!(summary.contains("problems 2 (1 high) -> 0 (0 high)"));
        }

        #[test]
        fn test_summary_shows_both_row_counts_on_mismatch() {
            let analyzer = PlanAnalyzer::default();
            let original = analyze_fixture("orders_original.json");
            let snapshot = load_plan("orders_optimized.json");
            let optimized = analyzer.analyze(&snapshot.explain, Some(49)).unwrap();

            let summary = summarize("orders_by_status", &analyzer.compare(original, optimized));
            assert!(summary.contains("rows 50 -> 49 (MISMATCH)"));
        }

        #[test]
        fn test_result_serializes_recommendation_sql() {
            let analyzer = PlanAnalyzer::default();
            let result = analyzer.compare(
                analyze_fixture("orders_original.json"),
                analyze_fixture("orders_optimized.json"),
            );
            let value = serde_json::to_value(&result).unwrap();

            let sqls: Vec<&str> = value["original"]["recommendations"]
                .as_array()
                .unwrap()
                .iter()
                .filter_map(|r| r["sql"].as_str())
                .collect();
            assert!(sqls.contains(&"CREATE INDEX idx_orders_status ON orders (status);"));
            assert_eq!(value["verdict"], "IMPROVED");
        }
    }
}
