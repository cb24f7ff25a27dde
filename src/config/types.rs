use crate::crawler::CrawlMode;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Oscar-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page listing the year selectors; its data endpoint is the same URL
    /// queried with `ajax=true&year=<year>`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Mode used when a request does not name one
    #[serde(rename = "default-mode", default)]
    pub default_mode: CrawlMode,

    /// Maximum number of rendering sessions open at the same time
    #[serde(rename = "max-concurrent-sessions")]
    pub max_concurrent_sessions: u32,

    /// How long a session waits for the film table to render (milliseconds)
    #[serde(rename = "render-timeout-ms")]
    pub render_timeout_ms: u64,

    /// Delay between checks of the film table while waiting (milliseconds)
    #[serde(rename = "render-poll-interval-ms", default = "default_poll_interval")]
    pub render_poll_interval_ms: u64,

    /// Per-request timeout for the data endpoint (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Attempts per year before the network strategy gives up
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Backoff after the first failed attempt; grows linearly per attempt
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on any single backoff delay
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Fixed year list used instead of probing the page (network mode only)
    #[serde(rename = "static-years", default)]
    pub static_years: Option<Vec<i32>>,
}

fn default_poll_interval() -> u64 {
    100
}

impl CrawlerConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn render_poll_interval(&self) -> Duration {
        Duration::from_millis(self.render_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the user agent as `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one JSON artifact per completed job
    #[serde(rename = "data-dir")]
    pub data_dir: String,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(rename = "bind-address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}
