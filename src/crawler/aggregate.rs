//! Result aggregation
//!
//! Strategies hand back outcomes in completion order. This module imposes
//! the output order (year ascending, then document order within a year) and
//! classifies the crawl as a whole.

use crate::crawler::YearOutcome;
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Overall result of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Every year succeeded
    AllSucceeded,

    /// At least one year succeeded and at least one failed
    PartialSuccess,

    /// No year succeeded
    TotalFailure,
}

/// A year that could not be collected, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedYear {
    pub year: i32,
    pub reason: String,
}

/// Merged outcomes of one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Records of all successful years, year ascending
    pub records: Vec<Record>,

    /// Failed years, year ascending
    pub failed_years: Vec<FailedYear>,

    /// Number of years that succeeded
    pub succeeded_years: usize,

    pub classification: Classification,
}

impl Aggregate {
    /// One-line description of every failed year
    pub fn failure_summary(&self) -> String {
        let details = self
            .failed_years
            .iter()
            .map(|f| format!("year={}: {}", f.year, f.reason))
            .collect::<Vec<_>>()
            .join("; ");

        match self.classification {
            Classification::TotalFailure if self.failed_years.is_empty() => {
                "no years were collected".to_string()
            }
            Classification::TotalFailure => format!(
                "all {} years failed: {}",
                self.failed_years.len(),
                details
            ),
            _ => details,
        }
    }
}

/// Merges per-year outcomes into one ordered result
///
/// # Example
///
/// ```
/// use oscar_crawl::crawler::{aggregate, Classification, YearOutcome};
///
/// let result = aggregate(vec![
///     YearOutcome::Failure { year: 2011, reason: "timeout".to_string() },
///     YearOutcome::Success { year: 2010, records: vec![] },
/// ]);
/// assert_eq!(result.classification, Classification::PartialSuccess);
/// assert_eq!(result.failed_years[0].year, 2011);
/// ```
pub fn aggregate(mut outcomes: Vec<YearOutcome>) -> Aggregate {
    // Stable: equal years keep their relative order.
    outcomes.sort_by_key(YearOutcome::year);

    let mut records = Vec::new();
    let mut failed_years = Vec::new();
    let mut succeeded_years = 0;

    for outcome in outcomes {
        match outcome {
            YearOutcome::Success {
                records: year_records,
                ..
            } => {
                succeeded_years += 1;
                records.extend(year_records);
            }
            YearOutcome::Failure { year, reason } => {
                failed_years.push(FailedYear { year, reason });
            }
        }
    }

    let classification = match (succeeded_years, failed_years.len()) {
        (0, _) => Classification::TotalFailure,
        (_, 0) => Classification::AllSucceeded,
        _ => Classification::PartialSuccess,
    };

    Aggregate {
        records,
        failed_years,
        succeeded_years,
        classification,
    }
}
