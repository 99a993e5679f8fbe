//! Persistence of the aggregate result.
//!
//! # Submodules
//!
//! - [`tabular`]: Writes records as CSV with a fixed header
//! - [`json`]: Writes records as an indented JSON array
//!
//! Both files are rendered completely in memory and written with a single
//! call, so readers never observe a half-rendered file from a successful run.
//! A crash during the write itself can still leave a truncated file.

use crate::models::CanonicalRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

pub mod json;
pub mod tabular;

/// Column names, in order. Also the JSON key order.
pub const COLUMNS: [&str; 4] = ["title", "authors", "abstract_url", "source"];

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `records` to both output files.
///
/// The CSV is written first, then the JSON. Each file is replaced as a whole.
///
/// # Arguments
///
/// * `records` - Aggregated records, in output order
/// * `csv_path` - Destination of the CSV file; parent directories are created
/// * `json_path` - Destination of the JSON file; parent directories are created
///
/// # Errors
///
/// Returns the first [`PersistError`]. The run must not report success when
/// the collected data was not persisted.
#[instrument(level = "info", skip(records), fields(records = records.len()))]
pub async fn write(
    records: &[CanonicalRecord],
    csv_path: &Path,
    json_path: &Path,
) -> Result<(), PersistError> {
    tabular::write_csv(records, csv_path).await?;
    json::write_json(records, json_path).await?;
    info!(csv = %csv_path.display(), json = %json_path.display(), "Wrote output files");
    Ok(())
}

/// Create parent directories, then replace the file contents in one write.
pub(crate) async fn write_file(path: &Path, contents: &[u8]) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, contents).await.map_err(io_err)
}
