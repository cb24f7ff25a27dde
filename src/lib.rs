//! Oscar-Crawl: award-film extraction behind an asynchronous job API
//!
//! This crate collects award-film records from a paginated, script-rendered
//! page. Each crawl is a job that fans out one unit of work per year, either by
//! driving rendering sessions on a bounded blocking pool or by calling the
//! page's data endpoint directly with retry/backoff.

pub mod api;
pub mod config;
pub mod crawler;
pub mod jobs;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Oscar-Crawl operations
#[derive(Debug, Error)]
pub enum OscarError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Year discovery failed: {0}")]
    Discovery(#[from] crawler::DiscoveryError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] storage::PersistenceError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::JobStatus,
        to: state::JobStatus,
    },

    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while normalizing raw film fields into a [`record::Record`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is not numeric: {value}")]
    NotNumeric { field: &'static str, value: String },

    #[error("field '{field}' is not text: {value}")]
    NotText { field: &'static str, value: String },

    #[error("field '{field}' is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("best_picture is not a boolean: {0}")]
    NotBoolean(String),

    #[error("title is empty after trimming")]
    EmptyTitle,
}

/// Result type alias for Oscar-Crawl operations
pub type Result<T> = std::result::Result<T, OscarError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlMode, YearOutcome};
pub use jobs::{CrawlJob, JobId, JobManager};
pub use record::{normalize, RawRecord, Record};
pub use state::JobStatus;
