//! Job records
//!
//! A [`CrawlJob`] is the orchestration state of one crawl request. Every
//! status change goes through a checked transition method.

use crate::crawler::{CrawlMode, FailedYear};
use crate::record::Record;
use crate::state::JobStatus;
use crate::storage::JobArtifact;
use crate::OscarError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, unique job identifier
///
/// Rendered as 32 lowercase hex digits; parsing also accepts the hyphenated
/// UUID form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl TryFrom<String> for JobId {
    type Error = uuid::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.to_string()
    }
}

/// One crawl request and its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlJob {
    pub job_id: JobId,
    pub mode: CrawlMode,

    /// Years to collect; `None` means discover them
    pub requested_years: Option<Vec<i32>>,

    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Record>>,

    pub total_records: Option<usize>,

    /// Years that could not be collected, also on a completed job
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_years: Vec<FailedYear>,

    /// Failure summary; set only on `failed`
    pub error: Option<String>,

    pub storage_path: Option<PathBuf>,
}

impl CrawlJob {
    /// Creates a pending job
    ///
    /// An empty `requested_years` is treated as absent.
    pub fn new(mode: CrawlMode, requested_years: Option<Vec<i32>>) -> Self {
        Self {
            job_id: JobId::new(),
            mode,
            requested_years: requested_years.filter(|years| !years.is_empty()),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            records: None,
            total_records: None,
            failed_years: Vec::new(),
            error: None,
            storage_path: None,
        }
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), OscarError> {
        if !self.status.can_transition_to(next) {
            return Err(OscarError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::debug!("Job {}: {} -> {}", self.job_id, self.status, next);
        self.status = next;
        Ok(())
    }

    /// `pending -> running`
    pub fn start(&mut self) -> Result<(), OscarError> {
        self.transition(JobStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// `running -> completed`, with the result fields set together
    pub fn complete(
        &mut self,
        records: Vec<Record>,
        failed_years: Vec<FailedYear>,
        storage_path: PathBuf,
        finished_at: DateTime<Utc>,
    ) -> Result<(), OscarError> {
        self.transition(JobStatus::Completed)?;
        self.total_records = Some(records.len());
        self.records = Some(records);
        self.failed_years = failed_years;
        self.storage_path = Some(storage_path);
        self.finished_at = Some(finished_at);
        Ok(())
    }

    /// `running -> failed`
    pub fn fail(
        &mut self,
        error: impl Into<String>,
        failed_years: Vec<FailedYear>,
    ) -> Result<(), OscarError> {
        self.transition(JobStatus::Failed)?;
        let error = error.into();
        self.error = Some(if error.trim().is_empty() {
            "crawl failed".to_string()
        } else {
            error
        });
        self.failed_years = failed_years;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// The artifact a running job will persist once it completes
    pub fn completed_artifact(
        &self,
        records: &[Record],
        failed_years: &[FailedYear],
        finished_at: DateTime<Utc>,
        config_hash: Option<String>,
    ) -> JobArtifact {
        JobArtifact {
            job_id: self.job_id,
            mode: self.mode,
            status: JobStatus::Completed,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: Some(finished_at),
            config_hash,
            total_records: records.len(),
            failed_years: failed_years.to_vec(),
            records: records.to_vec(),
        }
    }
}
