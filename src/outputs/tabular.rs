//! CSV output.
//!
//! The header row is always present, so an empty aggregate produces a
//! header-only file rather than an empty one.

use super::{COLUMNS, PersistError, write_file};
use crate::models::CanonicalRecord;
use csv::WriterBuilder;
use std::path::Path;
use tracing::{info, instrument};

/// Render records as CSV, header first.
///
/// Fields with commas, quotes or newlines are quoted.
///
/// # Arguments
///
/// * `records` - Records in output order; may be empty
///
/// # Returns
///
/// The encoded file contents. An empty slice yields the header row alone.
///
/// # Errors
///
/// Returns [`PersistError::Csv`] if a record cannot be encoded.
pub fn to_csv(records: &[CanonicalRecord]) -> Result<Vec<u8>, PersistError> {
    // Headers are written by hand: serde-driven headers only appear once a
    // first record is serialized.
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| PersistError::Csv(e.into_error().into()))
}

#[instrument(level = "info", skip(records), fields(path = %path.display(), records = records.len()))]
pub async fn write_csv(records: &[CanonicalRecord], path: &Path) -> Result<(), PersistError> {
    let bytes = to_csv(records)?;
    write_file(path, &bytes).await?;
    info!(bytes = bytes.len(), "Wrote CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceTag;

    #[test]
    fn test_empty_aggregate_is_header_only() {
        let bytes = to_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "title,authors,abstract_url,source\n");
    }

    #[test]
    fn test_quotes_embedded_commas_and_newlines() {
        let records = vec![CanonicalRecord {
            title: "Line one\nline \"two\"".to_string(),
            authors: "A. Smith, B. Lee".to_string(),
            abstract_url: "https://x.example/1".to_string(),
            source: SourceTag::PubMed,
        }];

        let text = String::from_utf8(to_csv(&records).unwrap()).unwrap();
        assert_eq!(
            text,
            "title,authors,abstract_url,source\n\"Line one\nline \"\"two\"\"\",\"A. Smith, B. Lee\",https://x.example/1,PubMed\n"
        );
    }

    #[tokio::test]
    async fn test_round_trip_preserves_rows_and_order() {
        let records = vec![
            CanonicalRecord {
                title: "Great Paper".to_string(),
                authors: "A. Smith, B. Lee".to_string(),
                abstract_url: "https://arxiv.org/abs/2501.00001".to_string(),
                source: SourceTag::ArXiv,
            },
            CanonicalRecord {
                title: "No authors, one comma".to_string(),
                authors: String::new(),
                abstract_url: "https://ieeexplore.ieee.org/document/1/".to_string(),
                source: SourceTag::Ieee,
            },
            CanonicalRecord {
                title: "Custom".to_string(),
                authors: "Z".to_string(),
                abstract_url: "https://www.medrxiv.org/content/1".to_string(),
                source: SourceTag::from("medRxiv"),
            },
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.csv");

        write_csv(&records, &path).await.unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap(), &csv::StringRecord::from(COLUMNS.to_vec()));
        let back: Vec<CanonicalRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(back, records);
    }
}
