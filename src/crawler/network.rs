//! Network strategy
//!
//! This module collects years by calling the listing page's data endpoint
//! directly (`<base-url>?ajax=true&year=<year>`), including:
//! - Building the HTTP client with the crawler's user agent
//! - One request per year, all years in flight at once
//! - Retry with linear, capped backoff for transient failures
//! - Error classification (transient vs. permanent)

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::discovery::{DiscoveryError, YearDiscovery};
use crate::crawler::strategy::join_outcomes;
use crate::crawler::YearOutcome;
use crate::record::{normalize, RawRecord, Record};
use crate::{OscarError, ValidationError};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use url::Url;

/// Errors from requesting one year's data
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed body: {0}")]
    Body(String),

    #[error("invalid record #{index}: {source}")]
    InvalidRecord {
        index: usize,
        source: ValidationError,
    },

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<RequestError>,
    },
}

impl RequestError {
    /// Returns true if another attempt may succeed
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Transport error / timeout | Retry |
    /// | Non-success status | Retry |
    /// | Body is not a JSON list of rows | Retry |
    /// | A row fails validation | Fail the year |
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout | Self::Status(_) | Self::Body(_)
        )
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Attempt budget and backoff schedule for one year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Cap applied to every delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    ///
    /// Grows linearly (`base * attempt`) and never exceeds `max_delay`, so the
    /// schedule is non-decreasing.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.max(1))
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use oscar_crawl::config::UserAgentConfig;
/// use oscar_crawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "OscarCrawl".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(20)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// The data endpoint URL for one year
pub(crate) fn data_url(page_url: &Url, year: i32) -> Url {
    let mut url = page_url.clone();
    url.query_pairs_mut()
        .append_pair("ajax", "true")
        .append_pair("year", &year.to_string());
    url
}

/// Collects years through direct, concurrently issued data requests
#[derive(Debug, Clone)]
pub struct NetworkStrategy {
    client: Client,
    page_url: Url,
    retry: RetryPolicy,
    discovery: YearDiscovery,
}

impl NetworkStrategy {
    pub fn new(client: Client, page_url: Url, retry: RetryPolicy, discovery: YearDiscovery) -> Self {
        Self {
            client,
            page_url,
            retry,
            discovery,
        }
    }

    /// Builds the strategy from configuration
    ///
    /// Years come from `static-years` when configured, otherwise from probing
    /// the listing page.
    pub fn from_config(config: &Config) -> Result<Self, OscarError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let page_url = Url::parse(&config.crawler.base_url)
            .map_err(|e| crate::ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

        let discovery = match &config.crawler.static_years {
            Some(years) => YearDiscovery::Static(years.clone()),
            None => YearDiscovery::Page {
                client: client.clone(),
                page_url: page_url.clone(),
            },
        };

        Ok(Self::new(
            client,
            page_url,
            RetryPolicy::from_config(&config.crawler),
            discovery,
        ))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Collects every year concurrently
    ///
    /// `years` is used verbatim when given; otherwise years are discovered.
    /// Each year ends as exactly one outcome; a failing year never stops the
    /// others.
    ///
    /// # Errors
    ///
    /// Only discovery failures are returned as errors.
    pub async fn collect(&self, years: Option<Vec<i32>>) -> Result<Vec<YearOutcome>, DiscoveryError> {
        let years = match years {
            Some(years) => years,
            None => self.discovery.discover().await?,
        };

        tracing::info!("Network strategy collecting {} years", years.len());

        let mut set = JoinSet::new();
        for &year in &years {
            let this = self.clone();
            set.spawn(async move { this.collect_year(year).await });
        }

        Ok(join_outcomes(set, &years).await)
    }

    async fn collect_year(&self, year: i32) -> YearOutcome {
        match self.fetch_year(year).await {
            Ok(records) => {
                tracing::debug!("Year {}: {} records", year, records.len());
                YearOutcome::Success { year, records }
            }
            Err(e) => {
                tracing::warn!("Year {} failed: {}", year, e);
                YearOutcome::failure(year, e)
            }
        }
    }

    /// Fetches one year, retrying transient failures per the retry policy
    pub async fn fetch_year(&self, year: i32) -> Result<Vec<Record>, RequestError> {
        let url = data_url(&self.page_url, year);
        let mut attempt = 1;

        loop {
            match fetch_once(&self.client, &url).await {
                Ok(records) => return Ok(records),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= self.retry.max_attempts => {
                    return Err(RequestError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    })
                }
                Err(e) => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        "Year {} attempt {}/{} failed: {}; retrying in {:?}",
                        year,
                        attempt,
                        self.retry.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Issues a single data request and normalizes every row
async fn fetch_once(client: &Client, url: &Url) -> Result<Vec<Record>, RequestError> {
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RequestError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    let rows: Vec<RawRecord> =
        serde_json::from_str(&body).map_err(|e| RequestError::Body(e.to_string()))?;

    rows.iter()
        .enumerate()
        .map(|(index, raw)| {
            normalize(raw).map_err(|source| RequestError::InvalidRecord { index, source })
        })
        .collect()
}
