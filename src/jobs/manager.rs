//! Job manager - owns the job registry and runs crawls in the background
//!
//! `submit` registers a pending job and returns at once; a background task
//! then drives the job through its state machine:
//! - `pending -> running` when the task begins
//! - strategy dispatch and aggregation
//! - artifact persistence, before `completed` is exposed
//! - `running -> completed | failed`
//!
//! Each job entry has a single writer (its background task). The map itself
//! is guarded by an `RwLock` so lookups run concurrently with submissions.

use crate::config::Config;
use crate::crawler::{aggregate, Classification, CrawlMode, FailedYear, StrategySet};
use crate::jobs::{CrawlJob, JobId};
use crate::storage::{JobArtifact, JsonFileStore, PersistenceError, ResultStore};
use crate::OscarError;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Notify;

struct Inner {
    jobs: RwLock<HashMap<JobId, CrawlJob>>,
    strategies: StrategySet,
    store: Arc<dyn ResultStore>,
    config_hash: Option<String>,
    default_mode: CrawlMode,
    /// Signalled whenever a job reaches a terminal state
    finished: Notify,
}

/// Registry and scheduler for crawl jobs
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct JobManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("jobs", &self.job_count())
            .field("default_mode", &self.inner.default_mode)
            .finish_non_exhaustive()
    }
}

impl JobManager {
    pub fn new(
        strategies: StrategySet,
        store: Arc<dyn ResultStore>,
        config_hash: Option<String>,
    ) -> Self {
        Self::with_default_mode(strategies, store, config_hash, CrawlMode::default())
    }

    pub fn with_default_mode(
        strategies: StrategySet,
        store: Arc<dyn ResultStore>,
        config_hash: Option<String>,
        default_mode: CrawlMode,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: RwLock::new(HashMap::new()),
                strategies,
                store,
                config_hash,
                default_mode,
                finished: Notify::new(),
            }),
        }
    }

    /// Builds a manager with both strategies and a JSON file store
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `config_hash` - Hash of the configuration file, recorded in artifacts
    pub fn from_config(config: &Config, config_hash: Option<String>) -> Result<Self, OscarError> {
        let strategies = StrategySet::from_config(config)?;
        let store = JsonFileStore::new(&config.output.data_dir);
        Ok(Self::with_default_mode(
            strategies,
            Arc::new(store),
            config_hash,
            config.crawler.default_mode,
        ))
    }

    /// Mode used when a request names none
    pub fn default_mode(&self) -> CrawlMode {
        self.inner.default_mode
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.inner.store
    }

    /// Registers a job and schedules its crawl without waiting for it
    ///
    /// Returns a snapshot of the job as registered (always `pending`). Must be
    /// called from within a Tokio runtime.
    pub fn submit(&self, mode: CrawlMode, requested_years: Option<Vec<i32>>) -> CrawlJob {
        let job = CrawlJob::new(mode, requested_years);
        let job_id = job.job_id;

        self.write_jobs().insert(job_id, job.clone());
        tracing::info!(
            "Submitted job {} (mode={}, years={:?})",
            job_id,
            mode,
            job.requested_years
        );

        let manager = self.clone();
        tokio::spawn(async move {
            let worker = tokio::spawn(manager.clone().execute(job_id));
            if let Err(e) = worker.await {
                tracing::error!("Job {} task aborted: {}", job_id, e);
                let error = OscarError::TaskJoin(e.to_string()).to_string();
                manager.finish_failed(&job_id, error, vec![]);
            }
        });

        job
    }

    /// Current state of a job, if it exists
    pub fn lookup(&self, job_id: &JobId) -> Option<CrawlJob> {
        self.read_jobs().get(job_id).cloned()
    }

    pub fn job_count(&self) -> usize {
        self.read_jobs().len()
    }

    /// Waits until the job reaches a terminal state
    ///
    /// Returns `None` for an unknown job.
    pub async fn wait_for_terminal(&self, job_id: &JobId) -> Option<CrawlJob> {
        loop {
            let notified = self.inner.finished.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let job = self.lookup(job_id)?;
            if job.status.is_terminal() {
                return Some(job);
            }

            notified.await;
        }
    }

    async fn execute(self, job_id: JobId) {
        let Some(job) = self.update(&job_id, CrawlJob::start) else {
            return;
        };

        let strategy = self.inner.strategies.select(job.mode);
        tracing::info!("Job {} running with the {} strategy", job_id, strategy.mode());

        let outcomes = match strategy.collect(job.requested_years.clone()).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!("Job {} failed during discovery: {}", job_id, e);
                self.finish_failed(&job_id, OscarError::from(e).to_string(), vec![]);
                return;
            }
        };

        let result = aggregate(outcomes);
        match result.classification {
            Classification::TotalFailure => {
                let summary = result.failure_summary();
                tracing::error!("Job {} failed: {}", job_id, summary);
                self.finish_failed(&job_id, summary, result.failed_years);
            }
            classification => {
                if classification == Classification::PartialSuccess {
                    tracing::warn!(
                        "Job {} completed with {} failed years: {}",
                        job_id,
                        result.failed_years.len(),
                        result.failure_summary()
                    );
                }

                let finished_at = Utc::now();
                let artifact = job.completed_artifact(
                    &result.records,
                    &result.failed_years,
                    finished_at,
                    self.inner.config_hash.clone(),
                );

                match self.persist(artifact).await {
                    Ok(path) => {
                        tracing::info!(
                            "Job {} completed: {} records from {} years, saved to {}",
                            job_id,
                            result.records.len(),
                            result.succeeded_years,
                            path.display()
                        );
                        self.update(&job_id, |job| {
                            job.complete(result.records, result.failed_years, path, finished_at)
                        });
                        self.inner.finished.notify_waiters();
                    }
                    Err(e) => {
                        tracing::error!("Job {} could not be persisted: {}", job_id, e);
                        self.finish_failed(
                            &job_id,
                            OscarError::from(e).to_string(),
                            result.failed_years,
                        );
                    }
                }
            }
        }
    }

    /// Writes the artifact on the blocking pool
    async fn persist(&self, artifact: JobArtifact) -> Result<PathBuf, PersistenceError> {
        let store = Arc::clone(&self.inner.store);
        tokio::task::spawn_blocking(move || store.persist(&artifact))
            .await
            .map_err(|e| PersistenceError::Task(e.to_string()))?
    }

    fn finish_failed(&self, job_id: &JobId, error: String, failed_years: Vec<FailedYear>) {
        self.update(job_id, |job| job.fail(error, failed_years));
        self.inner.finished.notify_waiters();
    }

    /// Applies one transition to a job and returns the updated snapshot
    fn update<F>(&self, job_id: &JobId, apply: F) -> Option<CrawlJob>
    where
        F: FnOnce(&mut CrawlJob) -> Result<(), OscarError>,
    {
        let mut jobs = self.write_jobs();
        let Some(job) = jobs.get_mut(job_id) else {
            tracing::error!("Job {} is not registered", job_id);
            return None;
        };

        match apply(job) {
            Ok(()) => Some(job.clone()),
            Err(e) => {
                tracing::error!("Job {}: {}", job_id, e);
                None
            }
        }
    }

    fn read_jobs(&self) -> std::sync::RwLockReadGuard<'_, HashMap<JobId, CrawlJob>> {
        self.inner
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_jobs(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<JobId, CrawlJob>> {
        self.inner
            .jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
