//! API module
//!
//! HTTP surface of the job manager:
//! - `GET /health`
//! - `POST /crawl/oscar` submits a crawl job
//! - `GET /results/{job_id}` looks a job up

pub mod crawl;
pub mod error;

use crate::jobs::JobManager;
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the API router backed by `manager`
pub fn create_router(manager: JobManager) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/crawl/oscar", post(crawl::submit_crawl))
        .route("/results/{job_id}", get(crawl::get_results))
        .with_state(manager)
        .layer(TraceLayer::new_for_http())
}

/// GET /health
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
