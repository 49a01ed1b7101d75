use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pg_qperf_compare::config::{ComparisonConfig, Config, OutputConfig};
use pg_qperf_compare::services::{
    ComparisonReport, FilePlanProvider, PlanAnalyzer, PlanProvider, summarize,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration first
    let config = Config::load()?;

    // Initialize logging (stderr, so --stdout output stays clean JSON)
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    // Held until main returns so buffered file logs are flushed
    let _guard = if let Some(log_file) = &config.logging.file {
        let log_path = Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path
            .parent()
            .and_then(|p| p.to_str())
            .filter(|p| !p.is_empty())
            .unwrap_or("logs");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("pg-qperf-compare.log");
        // Rolling appender adds the date suffix
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        Some(guard)
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        None
    };
    tracing::info!("pg-qperf-compare starting up");
    tracing::info!("Configuration loaded: {} comparison(s)", config.comparisons.len());

    let analyzer = PlanAnalyzer::new(config.thresholds.clone());
    let provider = FilePlanProvider::new();

    let mut succeeded = 0usize;
    for comparison in &config.comparisons {
        match run_comparison(&analyzer, &provider, comparison, &config.output).await {
            Ok(()) => succeeded += 1,
            Err(e) => tracing::error!("Comparison '{}' failed: {:#}", comparison.name, e),
        }
    }

    tracing::info!("{} of {} comparison(s) completed", succeeded, config.comparisons.len());
    if succeeded == 0 {
        return Err("all comparisons failed".into());
    }
    Ok(())
}

async fn run_comparison(
    analyzer: &PlanAnalyzer,
    provider: &dyn PlanProvider,
    comparison: &ComparisonConfig,
    output: &OutputConfig,
) -> anyhow::Result<()> {
    tracing::info!(
        "Comparing '{}': {} vs {}",
        comparison.name,
        comparison.original,
        comparison.optimized
    );

    let (original, optimized) =
        tokio::join!(provider.fetch(&comparison.original), provider.fetch(&comparison.optimized));
    let (original, optimized) = (original?, optimized?);

    let original = analyzer.analyze(&original.explain, original.row_count)?;
    let optimized = analyzer.analyze(&optimized.explain, optimized.row_count)?;
    let result = analyzer.compare(original, optimized);

    tracing::info!("{}", summarize(&comparison.name, &result));

    let report = ComparisonReport::new(&comparison.name, &result);
    if output.stdout {
        println!("{}", report.to_json(output.pretty)?);
    } else {
        report.write_to(Path::new(&output.report_dir), output.pretty).await?;
    }
    Ok(())
}
