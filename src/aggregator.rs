//! Runs every registered source through fetch, parse and normalize.
//!
//! Sources are independent: a source that cannot be reached, answers with an
//! error status, or matches nothing contributes zero records and a report,
//! and the run carries on. Output is ordered by source registration order and
//! then by document order, whatever the concurrency.

use crate::config::{AggregatorConfig, ConfigError};
use crate::fetcher::Fetch;
use crate::models::{AggregateResult, CanonicalRecord, SourceOutcome, SourceReport, SourceTag};
use crate::normalize::normalize;
use crate::scrapers::{SourceParser, parser_for};
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use reqwest::header::HeaderMap;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// One source ready to run: where to fetch, what to send, how to parse.
pub struct RegisteredSource {
    pub url: String,
    pub headers: HeaderMap,
    pub parser: Box<dyn SourceParser>,
}

impl RegisteredSource {
    pub fn tag(&self) -> &SourceTag {
        self.parser.tag()
    }
}

pub struct Aggregator<F> {
    fetcher: F,
    sources: Vec<RegisteredSource>,
    concurrency: usize,
}

impl<F> Aggregator<F>
where
    F: Fetch,
{
    /// Compile every enabled source in `config`. Bad selectors, base URLs or
    /// headers fail here, before any request is made.
    pub fn from_config(config: &AggregatorConfig, fetcher: F) -> Result<Self, ConfigError> {
        if config.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        let sources = config
            .enabled_sources()
            .map(|source| {
                Ok(RegisteredSource {
                    url: source.url.clone(),
                    headers: config.headers_for(source)?,
                    parser: parser_for(source)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self::new(fetcher, sources, config.concurrency))
    }

    /// Build an aggregator from already registered sources.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Used for every source request
    /// * `sources` - Sources in registration order, which is also output order
    /// * `concurrency` - Sources fetched at once; 0 is treated as 1
    pub fn new(fetcher: F, sources: Vec<RegisteredSource>, concurrency: usize) -> Self {
        Self {
            fetcher,
            sources,
            concurrency: concurrency.max(1),
        }
    }

    pub fn sources(&self) -> &[RegisteredSource] {
        &self.sources
    }

    /// Collect from every source.
    ///
    /// # Returns
    ///
    /// All normalized records, grouped by source in registration order and in
    /// document order within a source, plus one report per source. Never
    /// fails; unreachable sources show up as failed reports.
    #[instrument(level = "info", skip_all, fields(sources = self.sources.len(), concurrency = self.concurrency))]
    pub async fn run(&self) -> AggregateResult {
        let t0 = Instant::now();

        // `buffered` yields in input order, so results stay in registration
        // order even when later sources finish first.
        let per_source: Vec<_> = stream::iter(self.sources.iter())
            .map(|source| self.collect_source(source))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut result = AggregateResult::default();
        for (records, report) in per_source {
            result.records.extend(records);
            result.reports.push(report);
        }

        info!(
            records = result.records.len(),
            failed_sources = result.failed_sources().count(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Aggregation finished"
        );
        result
    }

    #[instrument(level = "info", skip_all, fields(source = %source.tag(), url = %source.url))]
    async fn collect_source(
        &self,
        source: &RegisteredSource,
    ) -> (Vec<CanonicalRecord>, SourceReport) {
        let tag = source.tag().clone();

        let fetched = match self.fetcher.fetch(&source.url, &source.headers).await {
            Ok(fetched) => fetched,
            Err(failure) => {
                warn!(source = %tag, reason = %failure, "Source failed; continuing without it");
                let report = SourceReport {
                    source: tag,
                    outcome: SourceOutcome::Failed(failure),
                };
                return (Vec::new(), report);
            }
        };

        let page = source.parser.parse(&fetched.body);
        let raw_count = page.records.len();
        let records: Vec<_> = page
            .records
            .into_iter()
            .filter_map(|raw| {
                let link = raw.link.clone();
                let normalized = normalize(raw, &tag);
                if normalized.is_none() {
                    debug!(source = %tag, ?link, "Dropped record missing title or URL");
                }
                normalized
            })
            .collect();
        let rejected = raw_count - records.len();

        if records.is_empty() && page.gaps == 0 {
            debug!(
                source = %tag,
                body_preview = %truncate_for_log(&String::from_utf8_lossy(&fetched.body), 300),
                "No containers matched"
            );
        }
        info!(
            source = %tag,
            status = fetched.status_code,
            records = records.len(),
            gaps = page.gaps,
            rejected,
            "Collected source"
        );

        let report = SourceReport {
            source: tag,
            outcome: SourceOutcome::Collected {
                records: records.len(),
                gaps: page.gaps,
                rejected,
            },
        };
        (records, report)
    }
}
