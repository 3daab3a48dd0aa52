//! Figures shown by the `dashboard` command, computed from an exported file.

use rxmap_model::{CONFIDENCE_MAX, RunStatistics};
use rxmap_output::ExportRow;

/// Counts of confidence scores 1 through 10. Zero scores are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfidenceHistogram {
    buckets: [usize; CONFIDENCE_MAX as usize],
}

impl ConfidenceHistogram {
    pub fn from_scores(scores: impl IntoIterator<Item = u8>) -> Self {
        let mut histogram = Self::default();
        for score in scores {
            if (1..=CONFIDENCE_MAX).contains(&score) {
                histogram.buckets[usize::from(score - 1)] += 1;
            }
        }
        histogram
    }

    /// `(score, count)` for every score 1-10.
    pub fn buckets(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        (1..=CONFIDENCE_MAX).zip(self.buckets.iter().copied())
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().sum()
    }

    pub fn max_count(&self) -> usize {
        self.buckets.iter().copied().max().unwrap_or(0)
    }
}

/// Everything the dashboard renders.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub statistics: RunStatistics,
    pub histogram: ConfidenceHistogram,
    pub rows: Vec<ExportRow>,
}

impl DashboardData {
    pub fn from_rows(rows: Vec<ExportRow>) -> Self {
        let statistics = RunStatistics::from_outcomes(rows.iter().map(ExportRow::outcome));
        let histogram =
            ConfidenceHistogram::from_scores(rows.iter().map(|row| row.ai_confidence_score));
        Self {
            statistics,
            histogram,
            rows,
        }
    }
}

/// Text bar scaled so `max` fills `width` cells.
pub fn bar(count: usize, max: usize, width: usize) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    let cells = (count * width).div_ceil(max).max(1);
    "█".repeat(cells)
}
