//! JSON file result store
//!
//! Artifacts are written as indented JSON to `<data-dir>/oscar_<job_id>.json`.
//! Writes go to a sibling temporary file first and are renamed into place.

use crate::jobs::JobId;
use crate::storage::traits::{PersistenceError, PersistenceResult, ResultStore};
use crate::storage::JobArtifact;
use std::fs;
use std::path::PathBuf;

/// Result store that keeps one JSON file per job
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl ResultStore for JsonFileStore {
    fn artifact_path(&self, job_id: &JobId) -> PathBuf {
        self.data_dir.join(format!("oscar_{}.json", job_id))
    }

    fn persist(&self, artifact: &JobArtifact) -> PersistenceResult<PathBuf> {
        let path = self.artifact_path(&artifact.job_id);

        fs::create_dir_all(&self.data_dir).map_err(|source| PersistenceError::Write {
            path: self.data_dir.clone(),
            source,
        })?;

        let body = serde_json::to_vec_pretty(artifact).map_err(PersistenceError::Encode)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, body).map_err(|source| PersistenceError::Write {
            path: tmp_path.clone(),
            source,
        })?;

        if let Err(source) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PersistenceError::Write { path, source });
        }

        tracing::debug!(
            "Persisted {} records for job {} to {}",
            artifact.total_records,
            artifact.job_id,
            path.display()
        );

        Ok(path)
    }

    fn load(&self, job_id: &JobId) -> PersistenceResult<JobArtifact> {
        let path = self.artifact_path(job_id);
        let body = fs::read(&path).map_err(|source| PersistenceError::Read {
            path: path.clone(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|source| PersistenceError::Decode { path, source })
    }
}
