//! Jobs module
//!
//! # Components
//!
//! - `CrawlJob`, `JobId`: one crawl request and its lifecycle
//! - `JobManager`: the job registry; schedules crawls in the background,
//!   persists results and answers lookups

mod job;
mod manager;

pub use job::{CrawlJob, JobId};
pub use manager::JobManager;
