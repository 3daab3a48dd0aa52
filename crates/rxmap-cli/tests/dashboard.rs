//! Dashboard figures computed from an exported results file.

use rxmap_cli::dashboard::{DashboardData, bar};
use rxmap_model::{ConceptProposal, MappingRecord, ProductContext, ValidationResult};
use rxmap_output::{export_results, read_results};

fn product(code: &str, name: &str) -> ProductContext {
    ProductContext {
        code: code.to_string(),
        product_name: name.to_string(),
        ..ProductContext::default()
    }
}

fn proposal(concept: &str, confidence: u8) -> ConceptProposal {
    ConceptProposal {
        primary_concept: Some(concept.to_string()),
        confidence_score: confidence,
        ..ConceptProposal::default()
    }
}

fn records() -> Vec<MappingRecord> {
    vec![
        MappingRecord::started(0, product("1", "DOLIPRANE"))
            .with_proposal(proposal("acetaminophen 500 MG Oral Tablet", 9))
            .into_validated(
                ValidationResult::exact(
                    "acetaminophen 500 MG Oral Tablet",
                    "198440",
                    "acetaminophen 500 MG Oral Tablet",
                    Some("SCD".to_string()),
                ),
                7,
            ),
        MappingRecord::started(1, product("2", "CLAMOXYL"))
            .with_proposal(proposal("amoxicillin 500 MG Oral Capsule", 5))
            .into_validated(
                ValidationResult::approximate("amoxicillin", "308191", "amoxicillin 500 MG", None),
                7,
            ),
        MappingRecord::started(2, product("3", "MYSTERE"))
            .with_proposal(ConceptProposal::failed("no concept", None))
            .into_ai_failed(),
        MappingRecord::started(3, product("4", "INCONNU"))
            .with_proposal(proposal("unobtainium", 9))
            .into_validated(
                ValidationResult::not_found("unobtainium", "No results found for: unobtainium"),
                7,
            ),
    ]
}

#[test]
fn dashboard_statistics_match_engine_derivation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let records = records();
    let path = export_results(&records, dir.path(), "rxnorm_mapping").expect("export");

    let data = DashboardData::from_rows(read_results(&path).expect("read back"));
    let stats = data.statistics;

    assert_eq!(stats.total_processed, 4);
    assert_eq!(stats.successful_mappings, 2);
    assert_eq!(stats.failed_mappings, 2);
    assert_eq!(stats.needs_manual_review, 3);
    assert!((stats.success_rate - 50.0).abs() < 1e-9);
    assert!((stats.review_rate - 75.0).abs() < 1e-9);
    assert_eq!(stats, rxmap_model::RunStatistics::from_records(&records));
}

#[test]
fn histogram_counts_non_zero_scores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = export_results(&records(), dir.path(), "rxnorm_mapping").expect("export");

    let data = DashboardData::from_rows(read_results(&path).expect("read back"));
    let buckets: Vec<(u8, usize)> = data.histogram.buckets().collect();

    assert_eq!(data.histogram.total(), 3);
    assert_eq!(buckets[4], (5, 1));
    assert_eq!(buckets[8], (9, 2));
    assert_eq!(data.rows.len(), 4);
    assert_eq!(data.rows[1].rxnorm_tty, "APPROX");
}

#[test]
fn histogram_bars_scale_to_busiest_score() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = export_results(&records(), dir.path(), "rxnorm_mapping").expect("export");

    let data = DashboardData::from_rows(read_results(&path).expect("read back"));
    let max = data.histogram.max_count();
    let rendered = data
        .histogram
        .buckets()
        .filter(|(_, count)| *count > 0)
        .map(|(score, count)| format!("{score}: {count} {}", bar(count, max, 10)))
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(rendered, @r"
    5: 1 █████
    9: 2 ██████████
    ");
}

#[test]
fn unknown_status_counts_as_error() {
    let rows = vec![rxmap_output::ExportRow {
        final_status: "exploded".to_string(),
        needs_review: true,
        ..Default::default()
    }];
    let data = DashboardData::from_rows(rows);
    assert_eq!(data.statistics.errored, 1);
    assert_eq!(data.statistics.failed_mappings, 1);
}
