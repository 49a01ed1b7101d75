use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use validator::Validate;

use crate::services::plan_analyzer::AnalyzerThresholds;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub thresholds: AnalyzerThresholds,
    #[serde(rename = "comparison")]
    pub comparisons: Vec<ComparisonConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the JSON comparison reports are written to (default: ./reports)
    pub report_dir: String,
    /// Pretty-print the JSON report (default: true)
    pub pretty: bool,
    /// Print the report to stdout instead of writing a file
    pub stdout: bool,
}

/// One original/optimized pair of plan snapshots
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ComparisonConfig {
    #[validate(length(min = 1, message = "comparison name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "original plan path cannot be empty"))]
    pub original: String,
    #[validate(length(min = 1, message = "optimized plan path cannot be empty"))]
    pub optimized: String,
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pg-qperf-compare")]
#[command(version, about = "Compare PostgreSQL EXPLAIN ANALYZE plans of an original and an optimized query")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON) output of the original query
    #[arg(long, value_name = "PATH", requires = "optimized")]
    pub original: Option<String>,

    /// EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON) output of the optimized query
    #[arg(long, value_name = "PATH", requires = "original")]
    pub optimized: Option<String>,

    /// Name of the comparison given by --original/--optimized
    #[arg(long, value_name = "NAME", default_value = "query")]
    pub name: String,

    /// Report directory (overrides config file)
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<String>,

    /// Logging level (overrides config file, e.g., "info,pg_qperf_compare=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print the JSON report to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();
        Self::load_from(&cli_args)
    }

    pub fn load_from(cli_args: &CommandLineArgs) -> Result<Self, anyhow::Error> {
        // 1. Load from config file (use CLI --config if provided, otherwise find default)
        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        // 2. Override with environment variables
        config.apply_env_overrides();

        // 3. Override with command line arguments (highest priority)
        config.apply_cli_overrides(cli_args);

        // 4. Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,pg_qperf_compare=debug")
    /// - APP_LOG_FILE: Log file path (daily rolling)
    /// - APP_REPORT_DIR: Report directory (default: ./reports)
    /// - APP_REPORT_PRETTY: Pretty-print JSON reports (true/false)
    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(file) = std::env::var("APP_LOG_FILE") {
            tracing::info!("Override logging.file from env: {}", file);
            self.logging.file = Some(file).filter(|f| !f.is_empty());
        }

        if let Ok(dir) = std::env::var("APP_REPORT_DIR") {
            self.output.report_dir = dir;
            tracing::info!("Override output.report_dir from env: {}", self.output.report_dir);
        }

        if let Ok(pretty) = std::env::var("APP_REPORT_PRETTY")
            && let Ok(pretty) = pretty.parse()
        {
            self.output.pretty = pretty;
            tracing::info!("Override output.pretty from env: {}", self.output.pretty);
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }

        if let Some(dir) = &args.report_dir {
            self.output.report_dir = dir.clone();
            tracing::info!("Override output.report_dir from CLI: {}", self.output.report_dir);
        }

        if args.stdout {
            self.output.stdout = true;
        }

        // An explicit pair on the command line replaces the configured list
        if let (Some(original), Some(optimized)) = (&args.original, &args.optimized) {
            self.comparisons = vec![ComparisonConfig {
                name: args.name.clone(),
                original: original.clone(),
                optimized: optimized.clone(),
            }];
            tracing::info!("Using comparison '{}' from CLI", args.name);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.comparisons.is_empty() {
            anyhow::bail!(
                "No comparisons configured: pass --original and --optimized or add [[comparison]] entries"
            );
        }
        for comparison in &self.comparisons {
            comparison
                .validate()
                .map_err(|e| anyhow::anyhow!("Invalid comparison '{}': {}", comparison.name, e))?;
        }

        if !self.output.stdout && self.output.report_dir.trim().is_empty() {
            anyhow::bail!("output.report_dir cannot be empty");
        }

        let t = &self.thresholds;
        if t.seq_scan_rows == 0
            || t.index_candidate_rows == 0
            || t.sort_rows == 0
            || t.nested_loop_rows == 0
            || t.rows_removed_by_filter == 0
            || t.max_loops == 0
        {
            anyhow::bail!("Row and loop thresholds must be > 0");
        }
        if !(t.estimate_ratio_low > 0.0
            && t.estimate_ratio_low < 1.0
            && t.estimate_ratio_high > 1.0)
        {
            anyhow::bail!(
                "Estimate ratio bounds must satisfy 0 < estimate_ratio_low < 1 < estimate_ratio_high"
            );
        }
        if !(t.io_bound_ratio > 0.0 && t.io_bound_ratio <= 1.0) {
            anyhow::bail!("thresholds.io_bound_ratio must be in (0, 1]");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file: None }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { report_dir: "./reports".to_string(), pretty: true, stdout: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args_with_config(path: &Path) -> CommandLineArgs {
        CommandLineArgs {
            config: Some(path.to_string_lossy().to_string()),
            name: "query".to_string(),
            ..Default::default()
        }
    }

    const SAMPLE: &str = r#"
[logging]
level = "debug"

[output]
report_dir = "out"

[thresholds]
seq_scan_rows = 5000

[[comparison]]
name = "orders_by_customer"
original = "plans/original.json"
optimized = "plans/optimized.json"
"#;

    #[test]
    fn test_load_from_file() {
        let file = write_config(SAMPLE);
        let config = Config::load_from(&args_with_config(file.path())).unwrap();

        assert_eq!(config.output.report_dir, "out");
        assert!(config.output.pretty);
        assert_eq!(config.thresholds.seq_scan_rows, 5000);
        assert_eq!(config.thresholds.sort_rows, 1000);
        assert_eq!(config.comparisons.len(), 1);
        assert_eq!(config.comparisons[0].name, "orders_by_customer");
    }

    #[test]
    fn test_cli_pair_replaces_configured_comparisons() {
        let file = write_config(SAMPLE);
        let args = CommandLineArgs {
            original: Some("a.json".to_string()),
            optimized: Some("b.json".to_string()),
            name: "adhoc".to_string(),
            report_dir: Some("elsewhere".to_string()),
            log_level: Some("warn".to_string()),
            ..args_with_config(file.path())
        };
        let config = Config::load_from(&args).unwrap();

        assert_eq!(config.comparisons.len(), 1);
        assert_eq!(config.comparisons[0].name, "adhoc");
        assert_eq!(config.comparisons[0].original, "a.json");
        assert_eq!(config.output.report_dir, "elsewhere");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_no_comparisons_rejected() {
        let file = write_config("[logging]\nlevel = \"info\"\n");
        let err = Config::load_from(&args_with_config(file.path())).unwrap_err();
        assert!(err.to_string().contains("No comparisons configured"));
    }

    #[test]
    fn test_empty_comparison_path_rejected() {
        let file = write_config("[[comparison]]\nname = \"q\"\noriginal = \"\"\noptimized = \"b.json\"\n");
        assert!(Config::load_from(&args_with_config(file.path())).is_err());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let file = write_config(
            "[thresholds]\nestimate_ratio_low = 2.0\n\n[[comparison]]\nname = \"q\"\noriginal = \"a\"\noptimized = \"b\"\n",
        );
        let err = Config::load_from(&args_with_config(file.path())).unwrap_err();
        assert!(err.to_string().contains("Estimate ratio bounds"));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args = CommandLineArgs {
            config: Some("/nonexistent/config.toml".to_string()),
            ..Default::default()
        };
        assert!(Config::load_from(&args).is_err());
    }
}
