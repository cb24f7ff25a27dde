//! Crawler module for collecting film records year by year
//!
//! This module contains the crawl orchestration core, including:
//! - Year discovery (static or read from the page)
//! - The browser strategy: rendering sessions on a bounded blocking pool
//! - The network strategy: direct data requests with retry/backoff
//! - Strategy selection by crawl mode
//! - Aggregation of per-year outcomes into one ordered result

mod aggregate;
mod browser;
mod discovery;
mod network;
mod parser;
mod session;
mod strategy;

pub use aggregate::{aggregate, Aggregate, Classification, FailedYear};
pub use browser::BrowserStrategy;
pub use discovery::{dedupe_years, preferred_first_year, years_from_links, DiscoveryError, YearDiscovery};
pub use network::{build_http_client, NetworkStrategy, RequestError, RetryPolicy};
pub use parser::{parse_film_rows, parse_year_links, YearLink};
pub use session::{
    wait_for_rows, HttpSessionFactory, RenderSession, SessionError, SessionFactory, SessionGuard,
};
pub use strategy::{CrawlStrategy, StrategySet};

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which collection strategy a job uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Drive rendering sessions against the script-populated page
    #[default]
    #[serde(alias = "selenium")]
    Browser,

    /// Query the page's data endpoint directly
    #[serde(alias = "ajax")]
    Network,
}

impl CrawlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CrawlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "browser" | "selenium" => Ok(Self::Browser),
            "network" | "ajax" => Ok(Self::Network),
            other => Err(format!("unknown crawl mode '{}'", other)),
        }
    }
}

/// Result of collecting one year, produced exactly once per year per job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearOutcome {
    /// Rows of the year in document order
    Success { year: i32, records: Vec<Record> },

    /// The year could not be collected
    Failure { year: i32, reason: String },
}

impl YearOutcome {
    pub fn year(&self) -> i32 {
        match self {
            Self::Success { year, .. } | Self::Failure { year, .. } => *year,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn failure(year: i32, reason: impl fmt::Display) -> Self {
        Self::Failure {
            year,
            reason: reason.to_string(),
        }
    }
}
