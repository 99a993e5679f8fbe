//! Command-line interface definitions for the paper aggregator.
//!
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Built-in sources, default output files
/// paper_aggregator
///
/// # Custom source list, outputs under ./data
/// paper_aggregator -c sources.yaml --csv-output data/papers.csv --json-output data/papers.json
///
/// # Fetch up to four sources at once
/// paper_aggregator --concurrency 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML source configuration; the built-in sources are used when omitted
    #[arg(short, long, env = "PAPER_AGGREGATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output path for the CSV file
    #[arg(long, default_value = "papers.csv")]
    pub csv_output: PathBuf,

    /// Output path for the JSON file
    #[arg(long, default_value = "papers.json")]
    pub json_output: PathBuf,

    /// Number of sources fetched at the same time (overrides the config file)
    #[arg(long)]
    pub concurrency: Option<usize>,
}
