//! CSV writing and reading.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use rxmap_model::MappingRecord;

use crate::error::{ExportError, Result};
use crate::row::ExportRow;

/// Header row of every export, in order.
pub const EXPORT_COLUMNS: [&str; 26] = [
    "original_code",
    "original_name",
    "original_dci",
    "original_dosage",
    "original_form",
    "original_presentation",
    "ai_primary_concept",
    "ai_confidence_score",
    "ai_dosage_standardized",
    "ai_form_standardized",
    "ai_active_ingredient_english",
    "ai_mapping_strategy",
    "ai_reasoning",
    "ai_alternatives",
    "rxnorm_found",
    "rxnorm_rxcui",
    "rxnorm_name",
    "rxnorm_tty",
    "rxnorm_match_type",
    "rxnorm_search_term",
    "final_status",
    "needs_review",
    "processing_status",
    "error_message",
    "timestamp",
    "tokens_used",
];

/// `<prefix>_<YYYYmmdd_HHMMSS>.csv`
pub fn export_file_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// First free path for `file_name` in `dir`, adding `_1`, `_2`, ... before
/// the extension when needed.
fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = file_name.strip_suffix(".csv").unwrap_or(file_name);
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}.csv")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Write `records` to a new timestamped CSV in `output_dir`.
///
/// The directory is created if missing. Returns the written path.
pub fn export_results(
    records: &[MappingRecord],
    output_dir: &Path,
    prefix: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|source| ExportError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let path = unique_path(output_dir, &export_file_name(prefix, Local::now()));
    let csv_error = |source| ExportError::Csv {
        path: path.clone(),
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
    if records.is_empty() {
        writer.write_record(EXPORT_COLUMNS).map_err(csv_error)?;
    }
    for record in records {
        writer
            .serialize(ExportRow::from_record(record))
            .map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), rows = records.len(), "results exported");
    Ok(path)
}

/// Read an exported results file.
pub fn read_results(path: &Path) -> Result<Vec<ExportRow>> {
    let csv_error = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<ExportRow>, _>>()
        .map_err(csv_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            export_file_name("rxnorm_mapping", at),
            "rxnorm_mapping_20240309_140507.csv"
        );
    }

    #[test]
    fn test_unique_path_adds_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run.csv"), "").unwrap();
        fs::write(dir.path().join("run_1.csv"), "").unwrap();
        assert_eq!(unique_path(dir.path(), "run.csv"), dir.path().join("run_2.csv"));
        assert_eq!(unique_path(dir.path(), "other.csv"), dir.path().join("other.csv"));
    }
}
