//! Comparison report output

use anyhow::Context;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::services::plan_analyzer::ComparisonResult;
use crate::utils::StringExt;

/// Serialized form of one named comparison
#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    pub name: &'a str,
    pub generated_at: DateTime<Local>,
    #[serde(flatten)]
    pub result: &'a ComparisonResult,
}

impl<'a> ComparisonReport<'a> {
    pub fn new(name: &'a str, result: &'a ComparisonResult) -> Self {
        Self { name, generated_at: Local::now(), result }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty { serde_json::to_string_pretty(self) } else { serde_json::to_string(self) }
    }

    /// `{name}_{YYYYmmdd_HHMMSS}.json`, non-identifier characters replaced by `_`
    pub fn file_name(&self) -> String {
        let name: String = self
            .name
            .clean()
            .unwrap_or_else(|| "comparison".to_string())
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        format!("{}_{}.json", name, self.generated_at.format("%Y%m%d_%H%M%S"))
    }

    /// Write the report under `dir`, creating it if needed
    pub async fn write_to(&self, dir: &Path, pretty: bool) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

        let path = dir.join(self.file_name());
        let body = self.to_json(pretty)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;

        tracing::info!("Report written to {}", path.display());
        Ok(path)
    }
}
