//! Data models for scraped paper metadata and per-run results.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceTag`]: Provenance tag identifying which index a record came from
//! - [`RawRecord`]: Unnormalized fields extracted from one source's markup
//! - [`CanonicalRecord`]: The validated, persisted unit
//! - [`AggregateResult`]: Everything one run collected, plus a report per source

use crate::fetcher::FetchFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the index a record was collected from.
///
/// The four built-in sources have dedicated variants; anything else registered
/// from configuration lands in [`SourceTag::Custom`]. Tags serialize as the
/// plain display name (`"arXiv"`, `"bioRxiv"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceTag {
    ArXiv,
    BioRxiv,
    PubMed,
    Ieee,
    Custom(String),
}

impl SourceTag {
    pub fn as_str(&self) -> &str {
        match self {
            SourceTag::ArXiv => "arXiv",
            SourceTag::BioRxiv => "bioRxiv",
            SourceTag::PubMed => "PubMed",
            SourceTag::Ieee => "IEEE",
            SourceTag::Custom(name) => name,
        }
    }
}

impl From<String> for SourceTag {
    fn from(value: String) -> Self {
        match value.as_str() {
            "arXiv" => SourceTag::ArXiv,
            "bioRxiv" => SourceTag::BioRxiv,
            "PubMed" => SourceTag::PubMed,
            "IEEE" => SourceTag::Ieee,
            _ => SourceTag::Custom(value),
        }
    }
}

impl From<&str> for SourceTag {
    fn from(value: &str) -> Self {
        SourceTag::from(value.to_string())
    }
}

impl From<SourceTag> for String {
    fn from(tag: SourceTag) -> Self {
        match tag {
            SourceTag::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields pulled out of one matched container, before normalization.
///
/// `link` is already resolved against the source's base URL. A parser only
/// yields a record when title and link matched; authors may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub link: Option<String>,
}

/// The unified record written to both output files.
///
/// Field order here is the column order of the CSV and the key order of the
/// JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub title: String,
    pub authors: String,
    pub abstract_url: String,
    pub source: SourceTag,
}

/// What happened to a single source during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// The page was fetched and parsed. `gaps` counts containers skipped for
    /// a missing title or link; `rejected` counts records the normalizer dropped.
    Collected {
        records: usize,
        gaps: usize,
        rejected: usize,
    },
    /// The fetch failed; the source contributed no records.
    Failed(FetchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: SourceTag,
    pub outcome: SourceOutcome,
}

impl SourceReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Failed(_))
    }
}

/// All records from one run, in source-registration order and then document
/// order, with one report per registered source.
#[derive(Debug, Default)]
pub struct AggregateResult {
    pub records: Vec<CanonicalRecord>,
    pub reports: Vec<SourceReport>,
}

impl AggregateResult {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| r.is_failed())
    }
}
