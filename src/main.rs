//! # Paper Aggregator
//!
//! Collects recently published research metadata (title, authors, abstract
//! URL, source) from several academic index sites and writes the combined
//! result to a CSV file and a JSON file.
//!
//! ## Usage
//!
//! ```sh
//! paper_aggregator --csv-output papers.csv --json-output papers.json
//! ```
//!
//! ## Architecture
//!
//! The application is a single batch pipeline:
//! 1. **Fetching**: One GET per configured source, bounded by a timeout
//! 2. **Parsing**: Source-specific selectors turn the page into raw records
//! 3. **Normalizing**: Labels and whitespace are stripped; incomplete records dropped
//! 4. **Output**: The ordered aggregate is written as CSV and JSON
//!
//! A source that fails contributes nothing and the run continues. Only a
//! failure to write the output files fails the run.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod config;
mod fetcher;
mod models;
mod normalize;
mod outputs;
mod scrapers;
mod utils;

use aggregator::Aggregator;
use cli::Cli;
use config::AggregatorConfig;
use fetcher::{HttpFetcher, RetryFetch};
use models::{AggregateResult, SourceOutcome};
use utils::ensure_parent_writable;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("paper_aggregator starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.csv_output, ?args.json_output, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => AggregatorConfig::load(path)?,
        None => {
            info!("No config file given; using built-in sources");
            AggregatorConfig::default()
        }
    };
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    // Fail on an unusable output path before spending time on the network.
    for path in [&args.csv_output, &args.json_output] {
        if let Err(e) = ensure_parent_writable(path).await {
            error!(
                path = %path.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let fetcher = RetryFetch::new(
        HttpFetcher::new(&config.fetch)?,
        config.fetch.max_retries,
        config.fetch.retry_base_delay(),
    );
    let aggregator = Aggregator::from_config(&config, fetcher)?;
    info!(
        sources = aggregator.sources().len(),
        concurrency = config.concurrency,
        "Sources registered"
    );

    // ---- Crawl ----
    let result = aggregator.run().await;
    log_summary(&result);

    // ---- Output ----
    if let Err(e) = outputs::write(&result.records, &args.csv_output, &args.json_output).await {
        error!(error = %e, "Failed to write output files");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        records = result.records.len(),
        "Execution complete"
    );

    Ok(())
}

/// One line per source, then the totals.
fn log_summary(result: &AggregateResult) {
    for report in &result.reports {
        match &report.outcome {
            SourceOutcome::Collected {
                records,
                gaps,
                rejected,
            } => info!(source = %report.source, records, gaps, rejected, "Source summary"),
            SourceOutcome::Failed(reason) => {
                warn!(source = %report.source, %reason, "Source summary: failed")
            }
        }
    }

    let failed: Vec<String> = result
        .failed_sources()
        .map(|r| r.source.to_string())
        .collect();
    info!(
        total_records = result.records.len(),
        sources = result.reports.len(),
        failed = failed.len(),
        failed_sources = ?failed,
        "Run summary"
    );
}
