//! Run statistics derived from mapping records.

use serde::{Deserialize, Serialize};

use crate::record::{FinalStatus, MappingRecord};

/// Counts and rates over a set of records.
///
/// Always recomputed from the records; `successful_mappings +
/// failed_mappings == total_processed`. Review is an orthogonal flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_processed: usize,
    pub successful_mappings: usize,
    /// Records with status `failed`, `ai_failed` or `error`.
    pub failed_mappings: usize,
    pub needs_manual_review: usize,
    /// Breakdown of `failed_mappings`.
    pub validation_failed: usize,
    pub ai_failed: usize,
    pub errored: usize,
    /// Percentage of successful records, 0 for an empty run.
    pub success_rate: f64,
    /// Percentage of records flagged for review, 0 for an empty run.
    pub review_rate: f64,
}

impl RunStatistics {
    pub fn from_records(records: &[MappingRecord]) -> Self {
        Self::from_outcomes(
            records
                .iter()
                .map(|record| (record.final_status, record.needs_review)),
        )
    }

    /// Build statistics from `(final_status, needs_review)` pairs.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (FinalStatus, bool)>,
    {
        let mut stats = Self::default();
        for (status, needs_review) in outcomes {
            stats.total_processed += 1;
            match status {
                FinalStatus::Success => stats.successful_mappings += 1,
                FinalStatus::Failed => stats.validation_failed += 1,
                FinalStatus::AiFailed => stats.ai_failed += 1,
                FinalStatus::Error => stats.errored += 1,
            }
            if needs_review {
                stats.needs_manual_review += 1;
            }
        }
        stats.failed_mappings = stats.validation_failed + stats.ai_failed + stats.errored;
        stats.success_rate = percentage(stats.successful_mappings, stats.total_processed);
        stats.review_rate = percentage(stats.needs_manual_review, stats.total_processed);
        stats
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
