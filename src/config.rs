//! Per-run configuration: which sources to crawl and how to fetch them.
//!
//! An [`AggregatorConfig`] is built once in `main`, either from a YAML file or
//! from [`AggregatorConfig::default`], and handed to the aggregator by
//! reference. Nothing here is global.
//!
//! # File format
//!
//! ```yaml
//! concurrency: 1
//! fetch:
//!   timeout_secs: 30
//!   max_retries: 2
//! sources:
//!   - tag: arXiv
//!     url: https://arxiv.org/list/cs/recent
//!     base_url: https://arxiv.org
//!     selectors:
//!       container: div.meta
//!       title: div.list-title
//!       authors: div.list-authors
//!       link: a[href]
//! ```

use crate::models::SourceTag;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

/// Desktop browser user agent; some sources refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("source {source_tag}: invalid base URL {url:?}: {reason}")]
    BaseUrl {
        source_tag: SourceTag,
        url: String,
        reason: url::ParseError,
    },
    #[error("source {source_tag}: invalid {field} selector {selector:?}: {reason}")]
    Selector {
        source_tag: SourceTag,
        field: &'static str,
        selector: String,
        reason: String,
    },
    #[error("invalid header {name:?}: {reason}")]
    Header { name: String, reason: String },
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// How many sources may be fetched at the same time. 1 is strictly sequential.
    pub concurrency: usize,
    pub fetch: FetchConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Sent with every request; per-source headers take precedence.
    pub headers: BTreeMap<String, String>,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub tag: SourceTag,
    /// The listing page to fetch.
    pub url: String,
    /// Relative hrefs found on the page are resolved against this.
    pub base_url: String,
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

/// CSS selectors for one source. `title`, `authors` and `link` are matched
/// inside each `container` match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub container: String,
    pub title: String,
    pub authors: String,
    pub link: String,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
            max_retries: 0,
            retry_base_delay_ms: 500,
        }
    }
}

impl FetchConfig {
    /// Per-request deadline covering connect, headers and body.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for AggregatorConfig {
    /// The four built-in sources, in registration order.
    fn default() -> Self {
        Self {
            concurrency: 1,
            fetch: FetchConfig::default(),
            sources: vec![
                SourceConfig::new(
                    SourceTag::ArXiv,
                    "https://arxiv.org/list/cs/recent",
                    "https://arxiv.org",
                    ["div.meta", "div.list-title", "div.list-authors", "a[href]"],
                ),
                SourceConfig::new(
                    SourceTag::BioRxiv,
                    "https://www.biorxiv.org/content/early/recent",
                    "https://www.biorxiv.org",
                    [
                        "div.highwire-cite",
                        "span.highwire-cite-title",
                        "span.highwire-citation-authors",
                        "a[href]",
                    ],
                ),
                SourceConfig::new(
                    SourceTag::PubMed,
                    "https://pubmed.ncbi.nlm.nih.gov/?term=recent",
                    "https://pubmed.ncbi.nlm.nih.gov",
                    [
                        "article.full-docsum",
                        "a.docsum-title",
                        "span.docsum-authors",
                        "a[href]",
                    ],
                ),
                SourceConfig::new(
                    SourceTag::Ieee,
                    "https://ieeexplore.ieee.org/Xplore/home.jsp",
                    "https://ieeexplore.ieee.org",
                    [
                        "div.List-results-items",
                        "a.document-title",
                        "div.author",
                        "a.document-title",
                    ],
                ),
            ],
        }
    }
}

impl SourceConfig {
    /// An enabled source with no extra headers.
    ///
    /// # Arguments
    ///
    /// * `tag` - Source tag; built-in tags select the matching parser
    /// * `url` - Listing page to fetch
    /// * `base_url` - Base for resolving relative hrefs
    /// * `selectors` - `[container, title, authors, link]` CSS selectors
    pub fn new(tag: SourceTag, url: &str, base_url: &str, selectors: [&str; 4]) -> Self {
        let [container, title, authors, link] = selectors.map(str::to_string);
        Self {
            tag,
            url: url.to_string(),
            base_url: base_url.to_string(),
            selectors: SelectorConfig {
                container,
                title,
                authors,
                link,
            },
            headers: BTreeMap::new(),
            enabled: true,
        }
    }
}

impl AggregatorConfig {
    /// Load a YAML config file. Missing keys fall back to the defaults, so a
    /// file that only sets `concurrency` keeps the built-in sources.
    #[instrument(level = "info")]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        info!(
            sources = config.sources.len(),
            concurrency = config.concurrency,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        if config.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(config)
    }

    /// Sources that take part in this run, in registration order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Global headers with the source's own headers layered on top.
    pub fn headers_for(&self, source: &SourceConfig) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.fetch.headers.iter().chain(source.headers.iter()) {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::Header {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| ConfigError::Header {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }
}
