//! Year discovery
//!
//! Determines which years a job collects when the caller did not name any.
//! The network strategy either uses a configured static list or reads the
//! listing page; the browser strategy reads the anchors through its own
//! session and only needs [`years_from_links`].

use crate::crawler::parser::{parse_year_links, YearLink};
use crate::crawler::session::SessionError;
use reqwest::Client;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Errors that prevent the set of years from being known
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no year selectors found on {source_url}")]
    NoYearMarkers { source_url: String },

    #[error("failed to load {source_url}: {message}")]
    Unreachable { source_url: String, message: String },

    #[error("session error during discovery: {0}")]
    Session(#[from] SessionError),

    #[error("discovery task failed: {0}")]
    Task(String),
}

/// How a strategy learns the years to collect
#[derive(Debug, Clone)]
pub enum YearDiscovery {
    /// A fixed list from configuration
    Static(Vec<i32>),

    /// Fetch the listing page and read its year anchors
    Page { client: Client, page_url: Url },
}

impl YearDiscovery {
    /// Returns the years to collect, de-duplicated in first-seen order
    pub async fn discover(&self) -> Result<Vec<i32>, DiscoveryError> {
        match self {
            Self::Static(years) => {
                let years = dedupe_years(years.iter().copied());
                if years.is_empty() {
                    return Err(DiscoveryError::NoYearMarkers {
                        source_url: "static configuration".to_string(),
                    });
                }
                tracing::debug!("Using {} statically configured years", years.len());
                Ok(years)
            }
            Self::Page { client, page_url } => {
                let unreachable = |message: String| DiscoveryError::Unreachable {
                    source_url: page_url.to_string(),
                    message,
                };

                let response = client
                    .get(page_url.clone())
                    .send()
                    .await
                    .map_err(|e| unreachable(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(unreachable(format!("HTTP {}", status.as_u16())));
                }

                let body = response
                    .text()
                    .await
                    .map_err(|e| unreachable(e.to_string()))?;

                let years = years_from_links(&parse_year_links(&body), page_url.as_str())?;
                tracing::info!("Discovered {} years on {}", years.len(), page_url);
                Ok(years)
            }
        }
    }
}

/// Removes duplicate years while keeping the first occurrence of each
pub fn dedupe_years(years: impl IntoIterator<Item = i32>) -> Vec<i32> {
    let mut seen = HashSet::new();
    years.into_iter().filter(|year| seen.insert(*year)).collect()
}

/// Turns the anchors found on a page into the year list
///
/// # Errors
///
/// Returns [`DiscoveryError::NoYearMarkers`] when the page has no usable anchors.
pub fn years_from_links(links: &[YearLink], source_url: &str) -> Result<Vec<i32>, DiscoveryError> {
    let years = dedupe_years(links.iter().map(|link| link.year));
    if years.is_empty() {
        return Err(DiscoveryError::NoYearMarkers {
            source_url: source_url.to_string(),
        });
    }
    Ok(years)
}

/// Picks the year the discovery session collects itself
///
/// The anchor the page marks `active` wins; otherwise the first anchor.
pub fn preferred_first_year(links: &[YearLink]) -> Option<i32> {
    links
        .iter()
        .find(|link| link.active)
        .or_else(|| links.first())
        .map(|link| link.year)
}
