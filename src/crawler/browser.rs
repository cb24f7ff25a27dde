//! Browser strategy
//!
//! Collects years by driving one rendering session per year. Sessions are
//! blocking and expensive, so:
//! - every session runs on the blocking pool, never on the async scheduler
//! - a process-wide semaphore caps how many sessions are open at once
//! - a session is closed before its semaphore slot is released
//!
//! Without a year list, one session discovers the years from the page and is
//! then reused to collect the first year; the remaining years fan out.

use crate::config::Config;
use crate::crawler::discovery::{preferred_first_year, years_from_links, DiscoveryError};
use crate::crawler::session::{
    wait_for_rows, HttpSessionFactory, RenderSession, SessionError, SessionFactory, SessionGuard,
};
use crate::crawler::strategy::join_outcomes;
use crate::crawler::YearOutcome;
use crate::record::{normalize, Record};
use crate::{OscarError, ValidationError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// Why a single year failed in a session
#[derive(Debug, Error)]
enum YearError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("invalid row #{index}: {source}")]
    InvalidRow {
        index: usize,
        source: ValidationError,
    },
}

/// Collects years through bounded, blocking rendering sessions
#[derive(Clone)]
pub struct BrowserStrategy {
    factory: Arc<dyn SessionFactory>,
    page_url: Url,
    sessions: Arc<Semaphore>,
    max_sessions: usize,
    render_timeout: Duration,
    poll_interval: Duration,
}

impl fmt::Debug for BrowserStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserStrategy")
            .field("page_url", &self.page_url.as_str())
            .field("max_sessions", &self.max_sessions)
            .field("render_timeout", &self.render_timeout)
            .finish_non_exhaustive()
    }
}

impl BrowserStrategy {
    /// Creates a strategy
    ///
    /// # Arguments
    ///
    /// * `factory` - Opens rendering sessions
    /// * `page_url` - The listing page every session navigates to
    /// * `max_sessions` - Upper bound on simultaneously open sessions (min 1)
    /// * `render_timeout` - How long to wait for a year's table
    /// * `poll_interval` - How often to check the table while waiting
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        page_url: Url,
        max_sessions: usize,
        render_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        let max_sessions = max_sessions.max(1);
        Self {
            factory,
            page_url,
            sessions: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
            render_timeout,
            poll_interval,
        }
    }

    /// Builds the strategy with HTTP-backed sessions from configuration
    pub fn from_config(config: &Config) -> Result<Self, OscarError> {
        let page_url = Url::parse(&config.crawler.base_url)
            .map_err(|e| crate::ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
        let factory = HttpSessionFactory::new(
            config.user_agent.header_value(),
            config.crawler.request_timeout(),
        );

        Ok(Self::new(
            Arc::new(factory),
            page_url,
            config.crawler.max_concurrent_sessions as usize,
            config.crawler.render_timeout(),
            config.crawler.render_poll_interval(),
        ))
    }

    /// Collects `years`, or discovers them with a first session when `None`
    ///
    /// # Errors
    ///
    /// Only a failure of the discovery step is returned as an error; every
    /// per-year failure becomes a [`YearOutcome::Failure`].
    pub async fn collect(&self, years: Option<Vec<i32>>) -> Result<Vec<YearOutcome>, DiscoveryError> {
        let (years, mut outcomes) = match years {
            Some(years) => (years, Vec::new()),
            None => {
                let (remaining, first) = self.discover_and_collect_first().await?;
                (remaining, vec![first])
            }
        };

        tracing::info!(
            "Browser strategy collecting {} years with at most {} sessions",
            years.len(),
            self.max_sessions
        );

        let mut set = JoinSet::new();
        for &year in &years {
            let this = self.clone();
            set.spawn(async move { this.collect_year(year).await });
        }

        outcomes.extend(join_outcomes(set, &years).await);
        Ok(outcomes)
    }

    /// Waits for a session slot; the slot is held until the permit drops
    async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit, String> {
        Arc::clone(&self.sessions)
            .acquire_owned()
            .await
            .map_err(|e| format!("session pool closed: {}", e))
    }

    async fn collect_year(&self, year: i32) -> YearOutcome {
        let permit = match self.acquire_slot().await {
            Ok(permit) => permit,
            Err(reason) => return YearOutcome::failure(year, reason),
        };

        let this = self.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            this.scrape_year(year)
        })
        .await;

        match joined {
            Ok(Ok(records)) => {
                tracing::debug!("Year {}: {} records", year, records.len());
                YearOutcome::Success { year, records }
            }
            Ok(Err(e)) => {
                tracing::warn!("Year {} failed: {}", year, e);
                YearOutcome::failure(year, e)
            }
            Err(e) => {
                tracing::error!("Session task for year {} did not finish: {}", year, e);
                YearOutcome::failure(year, format!("session task failed: {}", e))
            }
        }
    }

    async fn discover_and_collect_first(&self) -> Result<(Vec<i32>, YearOutcome), DiscoveryError> {
        let permit = self.acquire_slot().await.map_err(DiscoveryError::Task)?;

        let this = self.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            this.discover_blocking()
        })
        .await
        .map_err(|e| DiscoveryError::Task(e.to_string()))?
    }

    // ===== Blocking session work (runs on the blocking pool) =====

    fn scrape_year(&self, year: i32) -> Result<Vec<Record>, YearError> {
        let mut session = SessionGuard::open(self.factory.as_ref())?;
        session.navigate(&self.page_url)?;
        self.load_year(&mut *session, year)
    }

    fn discover_blocking(&self) -> Result<(Vec<i32>, YearOutcome), DiscoveryError> {
        let mut session = SessionGuard::open(self.factory.as_ref())?;
        session.navigate(&self.page_url)?;

        let links = session.year_links()?;
        let years = years_from_links(&links, self.page_url.as_str())?;
        let Some(first) = preferred_first_year(&links) else {
            return Err(DiscoveryError::NoYearMarkers {
                source_url: self.page_url.to_string(),
            });
        };

        tracing::info!(
            "Discovered {} years; collecting {} in the discovery session",
            years.len(),
            first
        );

        let outcome = match self.load_year(&mut *session, first) {
            Ok(records) => YearOutcome::Success {
                year: first,
                records,
            },
            Err(e) => {
                tracing::warn!("Year {} failed: {}", first, e);
                YearOutcome::failure(first, e)
            }
        };

        let remaining = years.into_iter().filter(|year| *year != first).collect();
        Ok((remaining, outcome))
    }

    fn load_year(&self, session: &mut dyn RenderSession, year: i32) -> Result<Vec<Record>, YearError> {
        session.activate_year(year)?;
        let rows = wait_for_rows(session, year, self.render_timeout, self.poll_interval)?;

        rows.iter()
            .enumerate()
            .map(|(index, raw)| normalize(raw).map_err(|source| YearError::InvalidRow { index, source }))
            .collect()
    }
}
