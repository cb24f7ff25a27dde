//! State module for tracking job progress
//!
//! # Components
//!
//! - `JobStatus`: the lifecycle of one crawl job (pending, running, completed, failed)

mod job_state;

// Re-export main types
pub use job_state::JobStatus;
