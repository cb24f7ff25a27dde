//! Network strategy and network-mode job tests

use crate::common::{
    create_manager, create_test_config, listing_page, mount_page, mount_year, mount_year_status,
    requests_for_year, ScriptedFactory, PAGE_PATH,
};
use oscar_crawl::crawler::{DiscoveryError, NetworkStrategy, RequestError, YearDiscovery};
use oscar_crawl::storage::ResultStore;
use oscar_crawl::{CrawlMode, JobStatus, YearOutcome};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_network_job_trims_title() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_year(
        &server,
        2010,
        json!([{
            "title": " The Hurt Locker ",
            "year": 2010,
            "nominations": 9,
            "awards": 6,
            "best_picture": true
        }]),
    )
    .await;

    let config = create_test_config(&server.uri(), dir.path());
    let manager = create_manager(&config, ScriptedFactory::new(&[]));

    let job = manager.submit(CrawlMode::Network, Some(vec![2010]));
    assert!(job.status.is_active());

    let job = manager.wait_for_terminal(&job.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total_records, Some(1));
    assert!(job.error.is_none());

    let records = job.records.clone().unwrap();
    assert_eq!(records[0].title, "The Hurt Locker");
    assert_eq!(records[0].year, 2010);
    assert_eq!(records[0].nominations, 9);
    assert_eq!(records[0].awards, 6);
    assert!(records[0].best_picture);

    let path = job.storage_path.clone().unwrap();
    assert_eq!(path, manager.store().artifact_path(&job.job_id));
    assert!(path.exists());
}

#[tokio::test]
async fn test_artifact_round_trip() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_year(
        &server,
        2011,
        json!([
            {"title": "The King's Speech", "year": 2011, "nominations": 12, "awards": 4, "best_picture": true},
            {"title": "Inception", "year": 2011, "nominations": 8, "awards": 4}
        ]),
    )
    .await;
    mount_year(
        &server,
        2010,
        json!([{"title": "The Hurt Locker", "year": 2010, "nominations": 9, "awards": 6, "best_picture": true}]),
    )
    .await;

    let config = create_test_config(&server.uri(), dir.path());
    let manager = create_manager(&config, ScriptedFactory::new(&[]));

    let job = manager.submit(CrawlMode::Network, Some(vec![2011, 2010]));
    let job = manager.wait_for_terminal(&job.job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    let records = job.records.clone().unwrap();
    let years: Vec<i32> = records.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2010, 2011, 2011]);
    assert_eq!(records[1].title, "The King's Speech");
    assert!(!records[2].best_picture);

    let artifact = manager.store().load(&job.job_id).unwrap();
    assert_eq!(artifact.records, records);
    assert_eq!(artifact.total_records, 3);
    assert_eq!(artifact.status, JobStatus::Completed);
    assert_eq!(artifact.mode, CrawlMode::Network);
    assert_eq!(artifact.config_hash.as_deref(), Some("test-hash"));
}

#[tokio::test]
async fn test_retries_transient_failures() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .and(query_param("year", "2012"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_year(
        &server,
        2012,
        json!([{"title": "Argo", "year": 2012, "nominations": 7, "awards": 3, "best_picture": true}]),
    )
    .await;

    let config = create_test_config(&server.uri(), dir.path());
    let strategy = NetworkStrategy::from_config(&config).unwrap();

    let records = strategy.fetch_year(2012).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(requests_for_year(&server, 2012).await, 3);
}

#[tokio::test]
async fn test_does_not_retry_success() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_year(
        &server,
        2013,
        json!([{"title": "12 Years a Slave", "year": 2013, "nominations": 9, "awards": 3, "best_picture": true}]),
    )
    .await;

    let config = create_test_config(&server.uri(), dir.path());
    let strategy = NetworkStrategy::from_config(&config).unwrap();

    strategy.fetch_year(2013).await.unwrap();
    assert_eq!(requests_for_year(&server, 2013).await, 1);
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_year() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_year_status(&server, 2014, 503).await;

    let config = create_test_config(&server.uri(), dir.path());
    let strategy = NetworkStrategy::from_config(&config).unwrap();
    assert_eq!(strategy.retry_policy().max_attempts, 3);

    match strategy.fetch_year(2014).await {
        Err(RequestError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, RequestError::Status(503)));
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert_eq!(requests_for_year(&server, 2014).await, 3);
}

#[tokio::test]
async fn test_malformed_record_fails_year_without_retry() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_year(
        &server,
        2015,
        json!([
            {"title": "Spotlight", "year": 2015, "nominations": 6, "awards": 2, "best_picture": true},
            {"title": "The Revenant", "year": 2015, "nominations": "many", "awards": 3}
        ]),
    )
    .await;

    let config = create_test_config(&server.uri(), dir.path());
    let strategy = NetworkStrategy::from_config(&config).unwrap();

    let outcomes = strategy.collect(Some(vec![2015])).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        YearOutcome::Failure { year, reason } => {
            assert_eq!(*year, 2015);
            assert!(reason.contains("nominations"), "reason: {}", reason);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(requests_for_year(&server, 2015).await, 1);
}

#[tokio::test]
async fn test_partial_failure_completes_with_failed_years() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_year(
        &server,
        2010,
        json!([{"title": "The Hurt Locker", "year": 2010, "nominations": 9, "awards": 6, "best_picture": true}]),
    )
    .await;
    mount_year_status(&server, 2011, 500).await;

    let config = create_test_config(&server.uri(), dir.path());
    let manager = create_manager(&config, ScriptedFactory::new(&[]));

    let job = manager.submit(CrawlMode::Network, Some(vec![2010, 2011]));
    let job = manager.wait_for_terminal(&job.job_id).await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total_records, Some(1));
    assert_eq!(job.failed_years.len(), 1);
    assert_eq!(job.failed_years[0].year, 2011);
    assert!(job.failed_years[0].reason.contains("HTTP 500"));

    let artifact = manager.store().load(&job.job_id).unwrap();
    assert_eq!(artifact.failed_years, job.failed_years);
}

#[tokio::test]
async fn test_total_failure_fails_job() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_year_status(&server, 2010, 500).await;
    mount_year_status(&server, 2011, 502).await;

    let config = create_test_config(&server.uri(), dir.path());
    let manager = create_manager(&config, ScriptedFactory::new(&[]));

    let job = manager.submit(CrawlMode::Network, Some(vec![2010, 2011]));
    let job = manager.wait_for_terminal(&job.job_id).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.records.is_none());
    assert!(job.storage_path.is_none());
    let error = job.error.clone().unwrap();
    assert!(error.contains("2010") && error.contains("2011"), "error: {}", error);
    assert!(!manager.store().artifact_path(&job.job_id).exists());
}

#[tokio::test]
async fn test_network_job_discovers_years_from_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Data endpoints before the page so the more specific matchers win
    mount_year(
        &server,
        2014,
        json!([{"title": "Birdman", "year": 2014, "nominations": 9, "awards": 4, "best_picture": true}]),
    )
    .await;
    mount_year(
        &server,
        2015,
        json!([{"title": "Spotlight", "year": 2015, "nominations": 6, "awards": 2, "best_picture": true}]),
    )
    .await;
    mount_page(&server, listing_page(&[2014, 2015, 2014], Some(2015))).await;

    let config = create_test_config(&server.uri(), dir.path());
    let manager = create_manager(&config, ScriptedFactory::new(&[]));

    let job = manager.submit(CrawlMode::Network, None);
    let job = manager.wait_for_terminal(&job.job_id).await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    let titles: Vec<String> = job.records.unwrap().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["Birdman", "Spotlight"]);
}

#[tokio::test]
async fn test_page_discovery() {
    let server = MockServer::start().await;
    mount_page(&server, listing_page(&[2015, 2014, 2015, 2013], None)).await;

    let discovery = YearDiscovery::Page {
        client: reqwest::Client::new(),
        page_url: Url::parse(&format!("{}{}", server.uri(), PAGE_PATH)).unwrap(),
    };

    assert_eq!(discovery.discover().await.unwrap(), vec![2015, 2014, 2013]);
}

#[tokio::test]
async fn test_page_discovery_without_markers() {
    let server = MockServer::start().await;
    mount_page(&server, "<html><body><p>Maintenance</p></body></html>".to_string()).await;

    let discovery = YearDiscovery::Page {
        client: reqwest::Client::new(),
        page_url: Url::parse(&format!("{}{}", server.uri(), PAGE_PATH)).unwrap(),
    };

    let result = discovery.discover().await;
    assert!(matches!(result, Err(DiscoveryError::NoYearMarkers { .. })));
}

#[tokio::test]
async fn test_network_discovery_failure_fails_job() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_page(&server, "<html><body></body></html>".to_string()).await;

    let config = create_test_config(&server.uri(), dir.path());
    let manager = create_manager(&config, ScriptedFactory::new(&[]));

    let job = manager.submit(CrawlMode::Network, None);
    let job = manager.wait_for_terminal(&job.job_id).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().contains("discovery"));
    assert!(!manager.store().artifact_path(&job.job_id).exists());
}
