//! Rendering session capability
//!
//! A session is one automation context able to navigate to the listing page,
//! activate a year selector and read back the rows the page's script renders.
//! Sessions are blocking and heavy; the browser strategy only ever drives them
//! from the blocking pool, one session per unit of work.
//!
//! [`HttpSessionFactory`] is the built-in implementation. It emulates the page
//! script over plain HTTP: activating a year issues the same data request the
//! page would and renders the returned rows.

use crate::crawler::network::data_url;
use crate::crawler::parser::{parse_film_rows, parse_year_links, YearLink};
use crate::record::RawRecord;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Errors raised by a rendering session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("failed to start session: {0}")]
    Start(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("year selector {0} not found on page")]
    MissingSelector(i32),

    #[error("loading year {year} failed: {message}")]
    Interaction { year: i32, message: String },

    #[error("table for year {year} did not render within {waited_ms}ms")]
    RenderTimeout { year: i32, waited_ms: u64 },

    #[error("failed to read rendered rows: {0}")]
    Extraction(String),
}

/// One open rendering/automation context
pub trait RenderSession: Send {
    /// Loads the listing page
    fn navigate(&mut self, url: &Url) -> Result<(), SessionError>;

    /// Reads the year selector anchors of the loaded page
    fn year_links(&mut self) -> Result<Vec<YearLink>, SessionError>;

    /// Activates a year's selector, triggering the table load
    fn activate_year(&mut self, year: i32) -> Result<(), SessionError>;

    /// Reads the table rows for `year`; `None` while the table is not rendered
    fn rendered_rows(&mut self, year: i32) -> Result<Option<Vec<RawRecord>>, SessionError>;

    /// Releases the session's resources
    fn close(&mut self);
}

/// Opens new rendering sessions
pub trait SessionFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn RenderSession>, SessionError>;
}

/// Owns an open session and closes it when dropped
///
/// Holding sessions through this guard means every exit path (success,
/// error, timeout, panic unwinding) releases the session.
pub struct SessionGuard {
    session: Box<dyn RenderSession>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn RenderSession>) -> Self {
        Self { session }
    }

    /// Opens a session from `factory` and guards it
    pub fn open(factory: &dyn SessionFactory) -> Result<Self, SessionError> {
        let session = factory.open()?;
        tracing::trace!("Session opened");
        Ok(Self::new(session))
    }
}

impl Deref for SessionGuard {
    type Target = dyn RenderSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
        tracing::trace!("Session closed");
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard").finish_non_exhaustive()
    }
}

/// Blocks until the table for `year` has rows or `timeout` elapses
///
/// # Errors
///
/// - [`SessionError::RenderTimeout`] when no rows appear in time
/// - any error the session reports while reading
pub fn wait_for_rows(
    session: &mut dyn RenderSession,
    year: i32,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Vec<RawRecord>, SessionError> {
    let started = Instant::now();
    let deadline = started + timeout;

    loop {
        if let Some(rows) = session.rendered_rows(year)? {
            if !rows.is_empty() {
                return Ok(rows);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(SessionError::RenderTimeout {
                year,
                waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
        }

        std::thread::sleep(poll_interval.min(deadline - now));
    }
}

/// Opens [`HttpSession`]s identified by the crawler's user agent
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    user_agent: String,
    request_timeout: Duration,
}

impl HttpSessionFactory {
    pub fn new(user_agent: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            request_timeout,
        }
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open(&self) -> Result<Box<dyn RenderSession>, SessionError> {
        // Built on the calling (blocking) thread; a blocking client must not
        // be created or dropped on the async scheduler.
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| SessionError::Start(e.to_string()))?;

        Ok(Box::new(HttpSession {
            client,
            page_url: None,
            document: String::new(),
            loaded: None,
        }))
    }
}

/// A session emulating the listing page's script over HTTP
struct HttpSession {
    client: reqwest::blocking::Client,
    page_url: Option<Url>,
    document: String,
    loaded: Option<(i32, Vec<RawRecord>)>,
}

impl RenderSession for HttpSession {
    fn navigate(&mut self, url: &Url) -> Result<(), SessionError> {
        let navigation = |message: String| SessionError::Navigation {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| navigation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(navigation(format!("HTTP {}", response.status().as_u16())));
        }

        self.document = response.text().map_err(|e| navigation(e.to_string()))?;
        self.page_url = Some(url.clone());
        self.loaded = None;
        Ok(())
    }

    fn year_links(&mut self) -> Result<Vec<YearLink>, SessionError> {
        Ok(parse_year_links(&self.document))
    }

    fn activate_year(&mut self, year: i32) -> Result<(), SessionError> {
        let page_url = self
            .page_url
            .as_ref()
            .ok_or_else(|| SessionError::Interaction {
                year,
                message: "no page loaded".to_string(),
            })?;

        if !parse_year_links(&self.document)
            .iter()
            .any(|link| link.year == year)
        {
            return Err(SessionError::MissingSelector(year));
        }

        let interaction = |message: String| SessionError::Interaction { year, message };

        let response = self
            .client
            .get(data_url(page_url, year))
            .send()
            .map_err(|e| interaction(e.to_string()))?;

        if !response.status().is_success() {
            return Err(interaction(format!("HTTP {}", response.status().as_u16())));
        }

        let rows: Vec<RawRecord> = response
            .json()
            .map_err(|e| SessionError::Extraction(e.to_string()))?;

        self.loaded = Some((year, rows));
        Ok(())
    }

    fn rendered_rows(&mut self, year: i32) -> Result<Option<Vec<RawRecord>>, SessionError> {
        match &self.loaded {
            Some((loaded_year, rows)) if *loaded_year == year => Ok(Some(rows.clone())),
            Some(_) => Ok(None),
            None => {
                let rows = parse_film_rows(&self.document, year);
                Ok((!rows.is_empty()).then_some(rows))
            }
        }
    }

    fn close(&mut self) {
        self.document.clear();
        self.loaded = None;
        self.page_url = None;
    }
}
