//! Storage module for persisting job results
//!
//! This module handles writing the artifact of every completed job:
//! - One indented JSON file per job, at a path derived from the job id
//! - Atomic replacement so a reader never sees a half-written artifact
//! - Reading an artifact back for inspection and verification

mod json;
mod traits;

pub use json::JsonFileStore;
pub use traits::{PersistenceError, PersistenceResult, ResultStore};

use crate::crawler::{CrawlMode, FailedYear};
use crate::jobs::JobId;
use crate::record::Record;
use crate::state::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted form of a completed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobArtifact {
    pub job_id: JobId,
    pub mode: CrawlMode,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Hash of the configuration the job ran under, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,

    pub total_records: usize,

    #[serde(default)]
    pub failed_years: Vec<FailedYear>,

    pub records: Vec<Record>,
}
