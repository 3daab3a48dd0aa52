//! Per-record pipeline and batch loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, info_span, warn};

use rxmap_ingest::{SourceRow, build_product_context};
use rxmap_llm::ConceptProposer;
use rxmap_model::{MappingRecord, RunStatistics};
use rxmap_rxnorm::TerminologyValidator;

use crate::pacing::{FixedDelay, Pacer};
use crate::progress::{BatchProgress, NoProgress, ProgressObserver};
use crate::settings::PipelineSettings;

/// Owns the collaborators and the accumulated results of a run.
///
/// Results are append-only and kept in processing order.
pub struct MappingEngine {
    proposer: ConceptProposer,
    validator: TerminologyValidator,
    pacer: Box<dyn Pacer>,
    settings: PipelineSettings,
    cancel: Option<Arc<AtomicBool>>,
    results: Vec<MappingRecord>,
}

impl MappingEngine {
    pub fn new(
        proposer: ConceptProposer,
        validator: TerminologyValidator,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            proposer,
            validator,
            pacer: Box::new(FixedDelay(settings.rate_limit_delay())),
            settings,
            cancel: None,
            results: Vec::new(),
        }
    }

    /// Replace the inter-record pause.
    #[must_use]
    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Stop intake once `flag` is set. Checked before each record.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Every record processed so far.
    pub fn results(&self) -> &[MappingRecord] {
        &self.results
    }

    pub fn statistics(&self) -> RunStatistics {
        RunStatistics::from_records(&self.results)
    }

    /// Map one source row. Never fails; problems end up in the record.
    pub fn process_record(&self, index: usize, row: &SourceRow) -> MappingRecord {
        self.process_record_with(index, row, &mut NoProgress)
    }

    fn process_record_with(
        &self,
        index: usize,
        row: &SourceRow,
        observer: &mut dyn ProgressObserver,
    ) -> MappingRecord {
        let _span = info_span!("record", index).entered();
        let record = MappingRecord::started(index, build_product_context(row));
        observer.record_started(index, &record.original);
        let record = self.finish_record(record);
        observer.record_finished(&record);
        record
    }

    fn finish_record(&self, record: MappingRecord) -> MappingRecord {
        let proposal = match guarded("concept proposal", || {
            self.proposer.propose(&record.original)
        }) {
            Ok(proposal) => proposal,
            Err(message) => {
                warn!(%message, "record aborted");
                return record.into_error(message);
            }
        };

        let candidates = proposal.candidates();
        let mapped = proposal.is_mapped();
        let record = record.with_proposal(proposal);
        if !mapped {
            debug!("no primary concept proposed, skipping validation");
            return record.into_ai_failed();
        }

        match guarded("terminology validation", || {
            self.validator.validate_candidates(&candidates)
        }) {
            Ok(validation) => {
                let record = record.into_validated(validation, self.settings.review_threshold);
                debug!(
                    status = %record.final_status,
                    needs_review = record.needs_review,
                    "record finished"
                );
                record
            }
            Err(message) => {
                warn!(%message, "record aborted");
                record.into_error(message)
            }
        }
    }

    /// Process rows `[start, start + size)`, clamped to the input.
    ///
    /// Returns the records appended by this batch.
    pub fn process_batch(
        &mut self,
        rows: &[SourceRow],
        start: usize,
        size: usize,
    ) -> &[MappingRecord] {
        self.process_batch_with(rows, start, size, &mut NoProgress)
    }

    /// [`Self::process_batch`] with progress events.
    pub fn process_batch_with(
        &mut self,
        rows: &[SourceRow],
        start: usize,
        size: usize,
        observer: &mut dyn ProgressObserver,
    ) -> &[MappingRecord] {
        let end = start.saturating_add(size).min(rows.len());
        let first_new = self.results.len();
        if start >= end {
            return &self.results[first_new..];
        }

        info!(start, end, "processing batch");
        observer.batch_started(start, end);

        for (index, row) in rows.iter().enumerate().take(end).skip(start) {
            if self.is_cancelled() {
                warn!(index, "cancellation requested, stopping batch");
                break;
            }
            let record = self.process_record_with(index, row, observer);
            self.results.push(record);
            self.pacer.pause();
        }

        &self.results[first_new..]
    }

    /// Walk batches from `start` until the input is exhausted or the run is
    /// cancelled.
    pub fn run(&mut self, rows: &[SourceRow], start: usize, observer: &mut dyn ProgressObserver) {
        let batch_size = self.settings.batch_size.max(1);
        let mut current = start;

        while current < rows.len() && !self.is_cancelled() {
            let end = current.saturating_add(batch_size).min(rows.len());
            self.process_batch_with(rows, current, batch_size, observer);

            let progress = BatchProgress {
                start: current,
                end,
                total_rows: rows.len(),
                statistics: self.statistics(),
            };
            info!(
                processed = progress.processed(),
                total = rows.len(),
                success_rate = progress.statistics.success_rate,
                review_rate = progress.statistics.review_rate,
                "batch complete"
            );
            observer.batch_finished(&progress);
            current = end;
        }
    }
}

/// Run `f`, turning a panic into an error message.
fn guarded<T>(step: &str, f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| format!("{step} failed unexpectedly: {}", panic_message(&*payload)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_messages() {
        let err = guarded("step", || -> u8 { panic!("boom") }).unwrap_err();
        assert_eq!(err, "step failed unexpectedly: boom");

        let detail = String::from("owned");
        let err = guarded("step", move || -> u8 { panic!("{detail}") }).unwrap_err();
        assert_eq!(err, "step failed unexpectedly: owned");

        assert_eq!(guarded("step", || 3), Ok(3));
    }
}
