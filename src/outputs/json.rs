//! JSON output for downstream consumers.
//!
//! The document is a top-level array of objects with the keys `title`,
//! `authors`, `abstract_url` and `source`, indented by four spaces and
//! terminated by a newline. An empty aggregate is written as `[]`.

use super::{PersistError, write_file};
use crate::models::CanonicalRecord;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::Path;
use tracing::{info, instrument};

/// Render records as an indented JSON array.
///
/// # Arguments
///
/// * `records` - Records in output order; may be empty
///
/// # Returns
///
/// UTF-8 bytes of the document, ending in a newline. An empty slice yields `[]\n`.
pub fn to_json(records: &[CanonicalRecord]) -> Result<Vec<u8>, PersistError> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

/// Write records to `path` as a JSON array.
#[instrument(level = "info", skip(records), fields(path = %path.display(), records = records.len()))]
pub async fn write_json(records: &[CanonicalRecord], path: &Path) -> Result<(), PersistError> {
    let bytes = to_json(records)?;
    write_file(path, &bytes).await?;
    info!(bytes = bytes.len(), "Wrote JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceTag;

    #[test]
    fn test_empty_aggregate_is_empty_array() {
        let bytes = to_json(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "[]\n");
    }

    #[test]
    fn test_layout_and_key_order() {
        let records = vec![CanonicalRecord {
            title: "Résumé of Ångström-scale imaging".to_string(),
            authors: "A. Smith".to_string(),
            abstract_url: "https://arxiv.org/abs/1".to_string(),
            source: SourceTag::ArXiv,
        }];

        let text = String::from_utf8(to_json(&records).unwrap()).unwrap();
        let expected = "[\n    {\n        \"title\": \"Résumé of Ångström-scale imaging\",\n        \"authors\": \"A. Smith\",\n        \"abstract_url\": \"https://arxiv.org/abs/1\",\n        \"source\": \"arXiv\"\n    }\n]\n";
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn test_write_json_reads_back() {
        let records = vec![CanonicalRecord {
            title: "T".to_string(),
            authors: String::new(),
            abstract_url: "https://pubmed.ncbi.nlm.nih.gov/1/".to_string(),
            source: SourceTag::PubMed,
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.json");

        write_json(&records, &path).await.unwrap();

        let back: Vec<CanonicalRecord> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(back, records);
    }
}
