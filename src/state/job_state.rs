/// Job status definitions for tracking crawl progress
///
/// This module defines the lifecycle a crawl job moves through and which
/// transitions between states are legal.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a crawl job
///
/// ```text
/// pending ──▶ running ──▶ completed
///                    └──▶ failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    // ===== Active States =====
    /// Job has been accepted but its background work has not started
    Pending,

    /// Background work is collecting years
    Running,

    // ===== Terminal States =====
    /// Records were collected and the artifact was written
    Completed,

    /// Nothing usable was collected, or the result could not be persisted
    Failed,
}

impl JobStatus {
    /// Returns true if this is a terminal state (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if this is an active state (job may still change)
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// No state is re-entrant and there is no cancellation edge.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    /// Converts the status to its wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
