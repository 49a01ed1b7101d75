//! Plan provider
//!
//! Supplies captured EXPLAIN output to the analyzer. The file-backed provider
//! reads JSON snapshots; other sources (e.g. a live database) can implement
//! [`PlanProvider`].

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::services::plan_analyzer::parser::node_keys;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to read plan {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in plan {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// EXPLAIN output plus the number of rows the query returned, when known
#[derive(Debug, Clone)]
pub struct PlanSnapshot {
    pub explain: Value,
    pub row_count: Option<u64>,
}

impl PlanSnapshot {
    /// Accepts raw EXPLAIN output (array or object) or a wrapper of the form
    /// `{"plan": <EXPLAIN output>, "row_count": N}`
    pub fn from_value(value: Value) -> Self {
        if let Value::Object(mut map) = value {
            if let Some(explain) = map.remove("plan") {
                let row_count = map.get("row_count").and_then(Value::as_u64);
                return Self { explain, row_count };
            }
            return Self { explain: Value::Object(map), row_count: None };
        }
        Self { explain: value, row_count: None }
    }

    /// Row count from the wrapper, else the root node's `Actual Rows`
    pub fn effective_row_count(&self) -> Option<u64> {
        self.row_count.or_else(|| {
            let top = match &self.explain {
                Value::Array(items) => items.first()?,
                other => other,
            };
            top.get(node_keys::PLAN)?.get(node_keys::ACTUAL_ROWS)?.as_u64()
        })
    }
}

#[async_trait]
pub trait PlanProvider: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<PlanSnapshot, ProviderError>;
}

/// Reads plan snapshots from JSON files, relative paths resolved against `base_dir`
#[derive(Debug, Clone, Default)]
pub struct FilePlanProvider {
    base_dir: Option<PathBuf>,
}

impl FilePlanProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: Some(base_dir.into()) }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl PlanProvider for FilePlanProvider {
    async fn fetch(&self, source: &str) -> Result<PlanSnapshot, ProviderError> {
        let path = self.resolve(source);
        let path_str = path.display().to_string();
        tracing::debug!("Loading plan snapshot from {}", path_str);

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ProviderError::Io { path: path_str.clone(), source })?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|source| ProviderError::Json { path: path_str.clone(), source })?;

        let snapshot = PlanSnapshot::from_value(value);
        let row_count = snapshot.effective_row_count();
        Ok(PlanSnapshot { row_count, ..snapshot })
    }
}
