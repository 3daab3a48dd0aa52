use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use proptest::prelude::*;
use rxmap_core::{BatchProgress, MappingEngine, Pacer, PipelineSettings, ProgressObserver};
use rxmap_ingest::SourceRow;
use rxmap_llm::{Completion, CompletionClient, CompletionRequest, ConceptProposer, OpenAiSettings};
use rxmap_model::{
    AI_MAPPING_FAILED, FinalStatus, MappingRecord, MatchKind, ProcessingStage, ProductContext,
};
use rxmap_rxnorm::{ApproximateResponse, DrugsResponse, TerminologyService, TerminologyValidator};

/// Replies are chosen by the product name found in the prompt.
struct ScriptedModel;

impl CompletionClient for ScriptedModel {
    fn complete(&self, request: &CompletionRequest) -> rxmap_llm::Result<Completion> {
        let prompt = &request.prompt;
        let text = if prompt.contains("DOLIPRANE") {
            r#"{"primary_rxnorm_concept": "acetaminophen 500 MG Oral Tablet", "confidence_score": 9}"#
        } else if prompt.contains("CLAMOXYL") {
            r#"{"primary_rxnorm_concept": "amoxicillin 500 MG Oral Capsule", "confidence_score": 5}"#
        } else if prompt.contains("MYSTERE") {
            r#"{"confidence_score": 3, "reasoning": "unknown product"}"#
        } else if prompt.contains("BOOM") {
            panic!("model client crashed");
        } else {
            r#"{"primary_rxnorm_concept": "unobtainium 1 MG", "confidence_score": 8,
                "alternative_concepts": ["unobtainium"]}"#
        };
        Ok(Completion {
            text: text.to_string(),
            total_tokens: 100,
        })
    }
}

const KNOWN: &[(&str, &str)] = &[
    ("acetaminophen 500 MG Oral Tablet", "198440"),
    ("amoxicillin 500 MG Oral Capsule", "308191"),
];

/// Knows a couple of SCD concepts and counts every lookup.
struct FakeRxNav {
    lookups: Rc<Cell<usize>>,
}

impl TerminologyService for FakeRxNav {
    fn find_drugs(&self, name: &str) -> rxmap_rxnorm::Result<Option<DrugsResponse>> {
        self.lookups.set(self.lookups.get() + 1);
        let body = match KNOWN.iter().find(|(known, _)| *known == name) {
            Some((known, rxcui)) => format!(
                r#"{{"drugGroup": {{"conceptGroup": [{{"tty": "SCD",
                    "conceptProperties": [{{"rxcui": "{rxcui}", "name": "{known}", "tty": "SCD"}}]}}]}}}}"#
            ),
            None => r#"{"drugGroup": {}}"#.to_string(),
        };
        Ok(Some(serde_json::from_str(&body).unwrap()))
    }

    fn approximate_term(
        &self,
        _term: &str,
        _max_entries: u32,
    ) -> rxmap_rxnorm::Result<Option<ApproximateResponse>> {
        self.lookups.set(self.lookups.get() + 1);
        Ok(Some(ApproximateResponse::default()))
    }
}

struct CountingPacer(Rc<Cell<usize>>);

impl Pacer for CountingPacer {
    fn pause(&self) {
        self.0.set(self.0.get() + 1);
    }
}

struct Harness {
    engine: MappingEngine,
    lookups: Rc<Cell<usize>>,
    pauses: Rc<Cell<usize>>,
}

fn harness(settings: PipelineSettings) -> Harness {
    let lookups = Rc::new(Cell::new(0));
    let pauses = Rc::new(Cell::new(0));
    let proposer = ConceptProposer::new(Box::new(ScriptedModel), OpenAiSettings::default());
    let validator = TerminologyValidator::new(
        Box::new(FakeRxNav {
            lookups: Rc::clone(&lookups),
        }),
        5,
    );
    let engine = MappingEngine::new(proposer, validator, settings)
        .with_pacer(Box::new(CountingPacer(Rc::clone(&pauses))));
    Harness {
        engine,
        lookups,
        pauses,
    }
}

fn row(name: &str) -> SourceRow {
    [
        ("NOM", name),
        ("DCI1", "PARACETAMOL"),
        ("DOSAGE1", "500"),
        ("UNITE_DOSAGE1", "mg"),
        ("FORME", "comprimé"),
        ("PRESENTATION", "Boite de 16"),
        ("CODE", "6118000041"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn rows(names: &[&str]) -> Vec<SourceRow> {
    names.iter().map(|name| row(name)).collect()
}

#[test]
fn confident_match_needs_no_review() {
    let h = harness(PipelineSettings::default());
    let record = h.engine.process_record(0, &row("DOLIPRANE"));

    assert_eq!(record.final_status, FinalStatus::Success);
    assert!(!record.needs_review);
    assert_eq!(record.processing_stage, ProcessingStage::Completed);
    let validation = record.validation.unwrap();
    assert_eq!(validation.rxcui.as_deref(), Some("198440"));
    assert_eq!(validation.match_kind, Some(MatchKind::Exact));
    assert_eq!(record.original.full_dosage, "500 mg");
}

#[test]
fn low_confidence_match_needs_review() {
    let h = harness(PipelineSettings::default());
    let record = h.engine.process_record(0, &row("CLAMOXYL"));
    assert_eq!(record.final_status, FinalStatus::Success);
    assert!(record.needs_review);
}

#[test]
fn review_threshold_is_configurable() {
    let h = harness(PipelineSettings {
        review_threshold: 5,
        ..PipelineSettings::default()
    });
    let record = h.engine.process_record(0, &row("CLAMOXYL"));
    assert!(!record.needs_review);
}

#[test]
fn missing_primary_skips_validation() {
    let h = harness(PipelineSettings::default());
    let record = h.engine.process_record(0, &row("MYSTERE"));

    assert_eq!(record.final_status, FinalStatus::AiFailed);
    assert!(record.needs_review);
    assert_eq!(record.processing_stage, ProcessingStage::AiCompleted);
    assert_eq!(
        record.validation.unwrap().error.as_deref(),
        Some(AI_MAPPING_FAILED)
    );
    assert_eq!(h.lookups.get(), 0);
}

#[test]
fn unvalidated_proposal_fails() {
    let h = harness(PipelineSettings::default());
    let record = h.engine.process_record(0, &row("INCONNU"));

    assert_eq!(record.final_status, FinalStatus::Failed);
    assert!(record.needs_review);
    let validation = record.validation.unwrap();
    assert!(!validation.found);
    assert_eq!(validation.search_term, "unobtainium 1 MG");
    // exact + approximate for each of the two candidates
    assert_eq!(h.lookups.get(), 4);
}

#[test]
fn panicking_collaborator_becomes_error_record() {
    let mut h = harness(PipelineSettings::default());
    let batch = h
        .engine
        .process_batch(&rows(&["BOOM", "DOLIPRANE"]), 0, 10)
        .to_vec();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].final_status, FinalStatus::Error);
    assert_eq!(batch[0].processing_stage, ProcessingStage::Error);
    assert!(batch[0].needs_review);
    assert!(batch[0].proposal.is_none());
    assert!(
        batch[0]
            .error_message
            .as_deref()
            .unwrap()
            .contains("model client crashed")
    );
    assert_eq!(batch[1].final_status, FinalStatus::Success);
}

#[test]
fn batch_is_clamped_and_ordered() {
    let mut h = harness(PipelineSettings::default());
    let input = rows(&["DOLIPRANE", "CLAMOXYL", "MYSTERE", "INCONNU"]);

    let indices: Vec<usize> = h
        .engine
        .process_batch(&input, 2, 10)
        .iter()
        .map(|r| r.index)
        .collect();

    assert_eq!(indices, vec![2, 3]);
    assert_eq!(h.pauses.get(), 2);
    assert!(h.engine.process_batch(&input, 4, 10).is_empty());
    assert_eq!(h.engine.results().len(), 2);
}

#[test]
fn statistics_cover_all_batches() {
    let mut h = harness(PipelineSettings::default());
    let input = rows(&["DOLIPRANE", "CLAMOXYL", "MYSTERE", "INCONNU", "BOOM"]);
    h.engine.process_batch(&input, 0, 2);
    h.engine.process_batch(&input, 2, 3);

    let stats = h.engine.statistics();
    assert_eq!(stats.total_processed, 5);
    assert_eq!(stats.successful_mappings, 2);
    assert_eq!(stats.failed_mappings, 3);
    assert_eq!(stats.ai_failed, 1);
    assert_eq!(stats.validation_failed, 1);
    assert_eq!(stats.errored, 1);
    assert_eq!(stats.needs_manual_review, 4);
    assert!((stats.success_rate - 40.0).abs() < 1e-9);
    assert!((stats.review_rate - 80.0).abs() < 1e-9);
}

/// Raises the cancel flag after `after` records.
struct CancelAfter {
    flag: Arc<AtomicBool>,
    after: usize,
    seen: usize,
    batches: Vec<BatchProgress>,
}

impl ProgressObserver for CancelAfter {
    fn record_finished(&mut self, _record: &MappingRecord) {
        self.seen += 1;
        if self.seen == self.after {
            self.flag.store(true, Ordering::SeqCst);
        }
    }

    fn batch_finished(&mut self, progress: &BatchProgress) {
        self.batches.push(progress.clone());
    }
}

#[test]
fn cancellation_keeps_finished_records() {
    let flag = Arc::new(AtomicBool::new(false));
    let Harness { engine, .. } = harness(PipelineSettings {
        batch_size: 2,
        ..PipelineSettings::default()
    });
    let mut engine = engine.with_cancel_flag(Arc::clone(&flag));
    let mut observer = CancelAfter {
        flag,
        after: 3,
        seen: 0,
        batches: Vec::new(),
    };

    engine.run(&rows(&["DOLIPRANE"; 6]), 0, &mut observer);

    assert!(engine.is_cancelled());
    assert_eq!(engine.results().len(), 3);
    assert_eq!(observer.batches.len(), 2);
    assert_eq!(observer.batches[1].processed(), 3);
}

#[test]
fn run_walks_every_batch() {
    let mut h = harness(PipelineSettings {
        batch_size: 3,
        ..PipelineSettings::default()
    });
    let mut observer = CancelAfter {
        flag: Arc::new(AtomicBool::new(false)),
        after: usize::MAX,
        seen: 0,
        batches: Vec::new(),
    };

    h.engine.run(&rows(&["DOLIPRANE"; 7]), 1, &mut observer);

    let ranges: Vec<(usize, usize)> = observer.batches.iter().map(|b| (b.start, b.end)).collect();
    assert_eq!(ranges, vec![(1, 4), (4, 7)]);
    assert_eq!(h.engine.results().len(), 6);
    assert_eq!(observer.batches[1].percentage(), 100);
}

#[test]
fn blank_row_is_still_recorded() {
    let h = harness(PipelineSettings::default());
    let record = h.engine.process_record(9, &SourceRow::new());
    assert_eq!(record.index, 9);
    assert_eq!(record.original, ProductContext::default());
    assert!(record.needs_review);
}

proptest! {
    #[test]
    fn one_pause_per_record(count in 0usize..12, start in 0usize..14, size in 1usize..8) {
        let mut h = harness(PipelineSettings::default());
        let input = rows(&vec!["DOLIPRANE"; count]);

        let processed = h.engine.process_batch(&input, start, size).len();

        prop_assert_eq!(processed, count.saturating_sub(start).min(size));
        prop_assert_eq!(h.pauses.get(), processed);
    }
}
