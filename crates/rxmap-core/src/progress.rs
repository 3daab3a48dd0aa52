//! Progress reporting for batch runs.

use rxmap_model::{MappingRecord, ProductContext, RunStatistics};

/// Snapshot taken after a batch finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    /// First row index of the batch.
    pub start: usize,
    /// One past the last row index of the batch.
    pub end: usize,
    /// Rows in the input.
    pub total_rows: usize,
    /// Statistics over every record so far.
    pub statistics: RunStatistics,
}

impl BatchProgress {
    /// Records processed so far, across all batches.
    pub fn processed(&self) -> usize {
        self.statistics.total_processed
    }

    /// Share of the input that has been processed, 0-100.
    pub fn percentage(&self) -> u8 {
        if self.total_rows == 0 {
            return 100;
        }
        ((self.end.min(self.total_rows) * 100) / self.total_rows) as u8
    }
}

/// Receives engine events. Every method defaults to a no-op.
pub trait ProgressObserver {
    fn batch_started(&mut self, _start: usize, _end: usize) {}

    fn record_started(&mut self, _index: usize, _product: &ProductContext) {}

    fn record_finished(&mut self, _record: &MappingRecord) {}

    fn batch_finished(&mut self, _progress: &BatchProgress) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}
