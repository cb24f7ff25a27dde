//! Output module for human-readable job summaries
//!
//! Used by the one-shot CLI mode to report a finished job.

use crate::jobs::CrawlJob;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Renders a job as a short plain-text report
pub fn format_job_summary(job: &CrawlJob) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Job {} ===\n", job.job_id);
    let _ = writeln!(out, "Mode:    {}", job.mode);
    let _ = writeln!(out, "Status:  {}", job.status);

    if let (Some(started), Some(finished)) = (job.started_at, job.finished_at) {
        let elapsed = (finished - started).num_milliseconds() as f64 / 1000.0;
        let _ = writeln!(out, "Elapsed: {:.2}s", elapsed);
    }

    if let Some(records) = &job.records {
        let mut per_year: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
        for record in records {
            let entry = per_year.entry(record.year).or_default();
            entry.0 += 1;
            if record.best_picture {
                entry.1 += 1;
            }
        }

        let _ = writeln!(out, "\nRecords: {}", records.len());
        for (year, (count, winners)) in per_year {
            let _ = writeln!(out, "  {}: {} films ({} best picture)", year, count, winners);
        }
    }

    if !job.failed_years.is_empty() {
        let _ = writeln!(out, "\nFailed years ({}):", job.failed_years.len());
        for failed in &job.failed_years {
            let _ = writeln!(out, "  - {}: {}", failed.year, failed.reason);
        }
    }

    if let Some(path) = &job.storage_path {
        let _ = writeln!(out, "\nSaved to: {}", path.display());
    }

    if let Some(error) = &job.error {
        let _ = writeln!(out, "\nError: {}", error);
    }

    out
}

/// Prints [`format_job_summary`] to stdout
pub fn print_job_summary(job: &CrawlJob) {
    print!("{}", format_job_summary(job));
}
