//! HTTP API tests, driven through the router without a listener

use crate::common::{create_manager, create_test_config, ScriptedFactory};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use oscar_crawl::api::create_router;
use oscar_crawl::{JobId, JobManager, JobStatus};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn create_app(dir: &TempDir) -> (Router, JobManager) {
    let config = create_test_config("http://127.0.0.1:9", dir.path());
    let manager = create_manager(&config, ScriptedFactory::new(&[2010, 2011]));
    (create_router(manager.clone()), manager)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn post_crawl(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/crawl/oscar")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let (app, _) = create_app(&dir);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_submit_returns_pending_job() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_app(&dir);

    let (status, body) = send(&app, post_crawl(r#"{"mode": "selenium", "years": [2010]}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let job: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(job["status"], "pending");
    assert_eq!(job["mode"], "browser");
    assert_eq!(job["requested_years"], serde_json::json!([2010]));

    let id: JobId = job["job_id"].as_str().unwrap().parse().unwrap();
    assert!(manager.lookup(&id).is_some());
}

#[tokio::test]
async fn test_submit_uses_default_mode_and_treats_empty_years_as_absent() {
    let dir = TempDir::new().unwrap();
    let (app, _) = create_app(&dir);

    let (status, body) = send(&app, post_crawl(r#"{"years": []}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let job: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(job["mode"], "browser");
    assert!(job["requested_years"].is_null());
}

#[tokio::test]
async fn test_submit_rejects_non_positive_years() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_app(&dir);

    let (status, body) = send(&app, post_crawl(r#"{"mode": "network", "years": [2010, -1]}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error: Value = serde_json::from_str(&body).unwrap();
    assert!(error["error"].as_str().unwrap().contains("-1"));
    assert_eq!(manager.job_count(), 0);
}

#[tokio::test]
async fn test_results_for_unknown_job() {
    let dir = TempDir::new().unwrap();
    let (app, _) = create_app(&dir);

    let (status, body) = send(&app, get(&format!("/results/{}", JobId::new()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: Value = serde_json::from_str(&body).unwrap();
    assert!(error["error"].as_str().unwrap().contains("not found"));

    let (status, _) = send(&app, get("/results/not-a-job-id")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_results_for_completed_job() {
    let dir = TempDir::new().unwrap();
    let (app, manager) = create_app(&dir);

    let (_, body) = send(&app, post_crawl(r#"{"mode": "browser", "years": [2011, 2010]}"#)).await;
    let submitted: Value = serde_json::from_str(&body).unwrap();
    let id: JobId = submitted["job_id"].as_str().unwrap().parse().unwrap();

    let finished = manager.wait_for_terminal(&id).await.unwrap();
    assert_eq!(finished.status, JobStatus::Completed);

    let (status, body) = send(&app, get(&format!("/results/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\n  \"job_id\""), "not indented: {}", body);

    let job: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(job["status"], "completed");
    assert_eq!(job["total_records"], 4);
    assert_eq!(job["records"][0]["year"], 2010);
    assert_eq!(job["records"][0]["title"], "Winner 2010");
    assert!(job["storage_path"].as_str().unwrap().ends_with(".json"));
    assert!(job["error"].is_null());
}
