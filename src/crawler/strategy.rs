//! Strategy selection
//!
//! A job's mode picks one of a closed set of strategies once, at job start.
//! Both strategies share the same contract: collect the given (or discovered)
//! years and return one outcome per year.

use crate::config::Config;
use crate::crawler::browser::BrowserStrategy;
use crate::crawler::discovery::DiscoveryError;
use crate::crawler::network::NetworkStrategy;
use crate::crawler::{CrawlMode, YearOutcome};
use crate::OscarError;
use tokio::task::JoinSet;

/// A collection strategy, resolved from a [`CrawlMode`]
#[derive(Debug, Clone)]
pub enum CrawlStrategy {
    Browser(BrowserStrategy),
    Network(NetworkStrategy),
}

impl CrawlStrategy {
    pub fn mode(&self) -> CrawlMode {
        match self {
            Self::Browser(_) => CrawlMode::Browser,
            Self::Network(_) => CrawlMode::Network,
        }
    }

    /// Collects `years`, or the discovered years when `None`
    pub async fn collect(&self, years: Option<Vec<i32>>) -> Result<Vec<YearOutcome>, DiscoveryError> {
        match self {
            Self::Browser(strategy) => strategy.collect(years).await,
            Self::Network(strategy) => strategy.collect(years).await,
        }
    }
}

/// Both strategies, built once and shared by every job
#[derive(Debug, Clone)]
pub struct StrategySet {
    browser: BrowserStrategy,
    network: NetworkStrategy,
}

impl StrategySet {
    pub fn new(browser: BrowserStrategy, network: NetworkStrategy) -> Self {
        Self { browser, network }
    }

    pub fn from_config(config: &Config) -> Result<Self, OscarError> {
        Ok(Self::new(
            BrowserStrategy::from_config(config)?,
            NetworkStrategy::from_config(config)?,
        ))
    }

    /// Resolves the strategy for `mode`
    pub fn select(&self, mode: CrawlMode) -> CrawlStrategy {
        match mode {
            CrawlMode::Browser => CrawlStrategy::Browser(self.browser.clone()),
            CrawlMode::Network => CrawlStrategy::Network(self.network.clone()),
        }
    }
}

/// Drains a set of per-year tasks, in completion order
///
/// A task that panics or is aborted cannot report its own outcome; every year
/// left without an outcome is recorded as a failure carrying the join error.
pub(crate) async fn join_outcomes(mut set: JoinSet<YearOutcome>, years: &[i32]) -> Vec<YearOutcome> {
    let mut outstanding = years.to_vec();
    let mut outcomes = Vec::with_capacity(years.len());
    let mut join_errors = Vec::new();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(outcome) => {
                if let Some(pos) = outstanding.iter().position(|y| *y == outcome.year()) {
                    outstanding.swap_remove(pos);
                }
                outcomes.push(outcome);
            }
            Err(e) => {
                tracing::error!("Year task did not finish: {}", e);
                join_errors.push(e.to_string());
            }
        }
    }

    for year in outstanding {
        outcomes.push(YearOutcome::failure(
            year,
            format!("collection task aborted: {}", join_errors.join("; ")),
        ));
    }

    outcomes
}
