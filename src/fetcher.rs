//! HTTP fetching with optional exponential backoff retry logic.
//!
//! The module uses a trait-based design so the aggregator never depends on
//! the network directly:
//! - [`Fetch`]: Core trait defining one GET against a source endpoint
//! - [`HttpFetcher`]: `reqwest`-backed implementation with a hard timeout
//! - [`RetryFetch`]: Decorator that adds bounded retries to any [`Fetch`]
//!
//! A fetch never returns an error across this boundary in the `?` sense: every
//! outcome, including transport failures and non-2xx statuses, is a
//! [`FetchResult`] value the caller inspects.
//!
//! # Retry Strategy
//!
//! - Disabled by default (`max_retries = 0`)
//! - Exponential backoff starting at the configured base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay

use crate::config::FetchConfig;
use rand::{Rng, rng};
use reqwest::header::HeaderMap;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status_code: u16,
    pub body: Vec<u8>,
}

/// Why a fetch produced no usable body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// Connection refused, DNS failure, TLS error, broken body stream.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    /// The server answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),
}

impl FetchFailure {
    /// Transport errors, timeouts, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchFailure::Transport(_) | FetchFailure::Timeout => true,
            FetchFailure::Status(code) => *code == 429 || (500..600).contains(code),
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchFailure::Timeout
        } else if let Some(status) = e.status() {
            FetchFailure::Status(status.as_u16())
        } else {
            FetchFailure::Transport(e.to_string())
        }
    }
}

pub type FetchResult = Result<Fetched, FetchFailure>;

/// Trait for issuing one GET against a source endpoint.
///
/// Implementors must bound the call in time; a request that takes too long is
/// reported as [`FetchFailure::Timeout`].
pub trait Fetch {
    async fn fetch(&self, url: &str, headers: &HeaderMap) -> FetchResult;
}

/// The network-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a client with the configured timeout and default user agent.
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client, timeout })
    }

    async fn get(&self, url: &str, headers: &HeaderMap) -> FetchResult {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(FetchFailure::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchFailure::from_reqwest)?;
        Ok(Fetched {
            status_code: status.as_u16(),
            body: body.to_vec(),
        })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "info", skip(self, headers))]
    async fn fetch(&self, url: &str, headers: &HeaderMap) -> FetchResult {
        let t0 = Instant::now();

        // The client timeout covers the request; this one also covers DNS
        // stalls and slow bodies.
        let result = match tokio::time::timeout(self.timeout, self.get(url, headers)).await {
            Ok(result) => result,
            Err(_) => Err(FetchFailure::Timeout),
        };

        match &result {
            Ok(fetched) => debug!(
                status = fetched.status_code,
                bytes = fetched.body.len(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Fetched page"
            ),
            Err(e) => warn!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                reason = %e,
                "Fetch failed"
            ),
        }
        result
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
///
/// Only failures for which [`FetchFailure::is_retryable`] holds are retried.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: Fetch,
{
    /// Wrap `inner`, retrying retryable failures up to `max_retries` times.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher doing the actual requests
    /// * `max_retries` - Extra attempts after the first; 0 disables retrying
    /// * `base_delay` - Delay before the first retry, doubled for each next one
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Fetch for RetryFetch<T>
where
    T: Fetch,
{
    #[instrument(level = "debug", skip(self, headers))]
    async fn fetch(&self, url: &str, headers: &HeaderMap) -> FetchResult {
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url, headers).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                reason = %e,
                                "fetch exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        reason = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
