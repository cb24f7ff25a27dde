//! Crawl job handlers

use crate::api::error::{ApiError, ApiResult};
use crate::crawler::CrawlMode;
use crate::jobs::{CrawlJob, JobId, JobManager};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

/// Body of `POST /crawl/oscar`
#[derive(Debug, Default, Deserialize)]
pub struct CrawlRequest {
    /// `browser` or `network` (`selenium`/`ajax` accepted); defaults to the
    /// configured mode
    #[serde(default)]
    pub mode: Option<CrawlMode>,

    /// Years to collect; absent or empty means discover them
    #[serde(default)]
    pub years: Option<Vec<i32>>,
}

/// POST /crawl/oscar
/// Submit a crawl job; returns the pending job
pub async fn submit_crawl(
    State(manager): State<JobManager>,
    Json(req): Json<CrawlRequest>,
) -> ApiResult<Json<CrawlJob>> {
    if let Some(bad) = req.years.iter().flatten().find(|year| **year <= 0) {
        return Err(ApiError::BadRequest(format!(
            "years must be positive integers, got {}",
            bad
        )));
    }

    let mode = req.mode.unwrap_or_else(|| manager.default_mode());
    let job = manager.submit(mode, req.years);

    Ok(Json(job))
}

/// GET /results/{job_id}
/// Current state of a job, rendered as indented JSON
pub async fn get_results(
    State(manager): State<JobManager>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    tracing::debug!("Looking up job: {}", job_id);

    let job = job_id
        .parse::<JobId>()
        .ok()
        .and_then(|id| manager.lookup(&id))
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", job_id)))?;

    let body = serde_json::to_string_pretty(&job)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
