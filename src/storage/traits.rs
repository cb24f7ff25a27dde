//! Storage traits and error types
//!
//! This module defines the trait interface for result stores and
//! associated error types.

use crate::jobs::JobId;
use crate::storage::JobArtifact;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting or reading an artifact
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode artifact: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("persistence task failed: {0}")]
    Task(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Durable home for completed job artifacts
///
/// Calls block on I/O; async callers run them on the blocking pool.
pub trait ResultStore: Send + Sync {
    /// Deterministic location of the artifact for `job_id`
    fn artifact_path(&self, job_id: &JobId) -> PathBuf;

    /// Writes the artifact and returns where it was written
    ///
    /// When this returns `Ok`, the artifact is complete on disk.
    fn persist(&self, artifact: &JobArtifact) -> PersistenceResult<PathBuf>;

    /// Reads a previously persisted artifact
    fn load(&self, job_id: &JobId) -> PersistenceResult<JobArtifact>;
}
