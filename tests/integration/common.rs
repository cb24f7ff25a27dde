//! Shared fixtures for the integration tests

use oscar_crawl::config::{Config, CrawlerConfig, OutputConfig, ServerConfig, UserAgentConfig};
use oscar_crawl::crawler::{
    BrowserStrategy, NetworkStrategy, RenderSession, SessionError, SessionFactory, StrategySet,
    YearLink,
};
use oscar_crawl::record::{RawField, RawRecord};
use oscar_crawl::storage::JsonFileStore;
use oscar_crawl::{CrawlMode, JobManager};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PAGE_PATH: &str = "/pages/ajax-javascript/";

/// Creates a test configuration pointing at `base_url`
pub fn create_test_config(base_url: &str, data_dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: format!("{}{}", base_url, PAGE_PATH),
            default_mode: CrawlMode::Network,
            max_concurrent_sessions: 3,
            render_timeout_ms: 300,
            render_poll_interval_ms: 5,
            request_timeout_ms: 2_000,
            max_attempts: 3,
            backoff_base_ms: 5,
            backoff_max_ms: 20,
            static_years: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            data_dir: data_dir.display().to_string(),
        },
        server: ServerConfig::default(),
    }
}

/// Listing page HTML with one anchor per year
pub fn listing_page(years: &[i32], active: Option<i32>) -> String {
    let links: String = years
        .iter()
        .map(|year| {
            let class = if Some(*year) == active {
                "year-link active"
            } else {
                "year-link"
            };
            format!(r##"<a href="#" class="{}" id="{}">{}</a>"##, class, year, year)
        })
        .collect();

    format!(
        r#"<html><body><div class="col-md-12">{}</div>
        <table class="table"><tbody id="table-body"></tbody></table></body></html>"#,
        links
    )
}

/// Mounts a data endpoint response for one year
pub async fn mount_year(server: &MockServer, year: i32, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .and(query_param("ajax", "true"))
        .and(query_param("year", year.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a failing data endpoint for one year
pub async fn mount_year_status(server: &MockServer, year: i32, status: u16) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .and(query_param("ajax", "true"))
        .and(query_param("year", year.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts the listing page itself; mount data endpoints first
pub async fn mount_page(server: &MockServer, html: String) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Number of requests the server received for `year`'s data
pub async fn requests_for_year(server: &MockServer, year: i32) -> usize {
    let wanted = format!("year={}", year);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.query().unwrap_or("").contains(&wanted))
        .count()
}

/// Open/close instrumentation shared by a factory and its sessions
#[derive(Debug, Default)]
pub struct SessionCounters {
    pub open: AtomicUsize,
    pub peak: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl SessionCounters {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// In-process session factory rendering two films per year
pub struct ScriptedFactory {
    pub links: Vec<YearLink>,
    pub stalled: HashSet<i32>,
    pub render_delay: Duration,
    pub counters: Arc<SessionCounters>,
}

impl ScriptedFactory {
    pub fn new(years: &[i32]) -> Self {
        Self {
            links: years
                .iter()
                .map(|year| YearLink {
                    year: *year,
                    active: false,
                })
                .collect(),
            stalled: HashSet::new(),
            render_delay: Duration::from_millis(1),
            counters: Arc::new(SessionCounters::default()),
        }
    }

    /// Years whose table never renders
    pub fn stalling(mut self, years: &[i32]) -> Self {
        self.stalled.extend(years.iter().copied());
        self
    }

    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }
}

impl SessionFactory for ScriptedFactory {
    fn open(&self) -> Result<Box<dyn RenderSession>, SessionError> {
        let now = self.counters.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        self.counters.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(ScriptedSession {
            links: self.links.clone(),
            stalled: self.stalled.clone(),
            render_delay: self.render_delay,
            counters: Arc::clone(&self.counters),
            current: None,
        }))
    }
}

struct ScriptedSession {
    links: Vec<YearLink>,
    stalled: HashSet<i32>,
    render_delay: Duration,
    counters: Arc<SessionCounters>,
    current: Option<i32>,
}

impl RenderSession for ScriptedSession {
    fn navigate(&mut self, _url: &Url) -> Result<(), SessionError> {
        Ok(())
    }

    fn year_links(&mut self) -> Result<Vec<YearLink>, SessionError> {
        Ok(self.links.clone())
    }

    fn activate_year(&mut self, year: i32) -> Result<(), SessionError> {
        self.current = Some(year);
        Ok(())
    }

    fn rendered_rows(&mut self, year: i32) -> Result<Option<Vec<RawRecord>>, SessionError> {
        std::thread::sleep(self.render_delay);
        if self.stalled.contains(&year) || self.current != Some(year) {
            return Ok(None);
        }

        Ok(Some(vec![
            film(&format!(" Winner {} ", year), year, "8", "5", true),
            film(&format!("Nominee {}", year), year, "4", "0", false),
        ]))
    }

    fn close(&mut self) {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn film(title: &str, year: i32, nominations: &str, awards: &str, best_picture: bool) -> RawRecord {
    RawRecord {
        title: Some(title.into()),
        year: Some(RawField::Int(year.into())),
        nominations: Some(nominations.into()),
        awards: Some(awards.into()),
        best_picture: Some(RawField::Bool(best_picture)),
    }
}

/// Builds a manager whose browser strategy drives `factory` and whose network
/// strategy targets `config`'s base URL
pub fn create_manager(config: &Config, factory: ScriptedFactory) -> JobManager {
    let page_url = Url::parse(&config.crawler.base_url).unwrap();
    let browser = BrowserStrategy::new(
        Arc::new(factory),
        page_url,
        config.crawler.max_concurrent_sessions as usize,
        config.crawler.render_timeout(),
        config.crawler.render_poll_interval(),
    );
    let network = NetworkStrategy::from_config(config).unwrap();

    JobManager::new(
        StrategySet::new(browser, network),
        Arc::new(JsonFileStore::new(&config.output.data_dir)),
        Some("test-hash".to_string()),
    )
}
