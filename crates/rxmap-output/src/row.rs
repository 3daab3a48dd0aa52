//! Flat export row.

use serde::{Deserialize, Serialize};

use rxmap_model::{FinalStatus, MappingRecord};

/// Timestamp layout used in exported rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One exported record. Field order is the column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRow {
    pub original_code: String,
    pub original_name: String,
    pub original_dci: String,
    pub original_dosage: String,
    pub original_form: String,
    pub original_presentation: String,

    pub ai_primary_concept: String,
    pub ai_confidence_score: u8,
    pub ai_dosage_standardized: String,
    pub ai_form_standardized: String,
    pub ai_active_ingredient_english: String,
    pub ai_mapping_strategy: String,
    pub ai_reasoning: String,
    /// Alternatives joined with `", "`.
    pub ai_alternatives: String,

    pub rxnorm_found: bool,
    pub rxnorm_rxcui: String,
    pub rxnorm_name: String,
    pub rxnorm_tty: String,
    pub rxnorm_match_type: String,
    pub rxnorm_search_term: String,

    pub final_status: String,
    pub needs_review: bool,
    pub processing_status: String,
    pub error_message: String,
    pub timestamp: String,

    pub tokens_used: u64,
}

impl ExportRow {
    pub fn from_record(record: &MappingRecord) -> Self {
        let original = &record.original;
        let mut row = Self {
            original_code: original.code.clone(),
            original_name: original.product_name.clone(),
            original_dci: original.active_ingredient.clone(),
            original_dosage: original.full_dosage.clone(),
            original_form: original.form.clone(),
            original_presentation: original.presentation.clone(),
            final_status: record.final_status.to_string(),
            needs_review: record.needs_review,
            processing_status: record.processing_stage.to_string(),
            error_message: record.error_detail().unwrap_or_default().to_string(),
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            ..Self::default()
        };

        if let Some(proposal) = &record.proposal {
            row.ai_primary_concept = proposal.primary_concept.clone().unwrap_or_default();
            row.ai_confidence_score = proposal.confidence_score;
            row.ai_dosage_standardized = proposal.dosage_standardized.clone();
            row.ai_form_standardized = proposal.form_standardized.clone();
            row.ai_active_ingredient_english = proposal.active_ingredient_english.clone();
            row.ai_mapping_strategy = proposal.mapping_strategy.clone();
            row.ai_reasoning = proposal.reasoning.clone();
            row.ai_alternatives = proposal.alternative_concepts.join(", ");
            row.tokens_used = proposal.tokens_used;
        }

        if let Some(validation) = &record.validation {
            row.rxnorm_found = validation.found;
            row.rxnorm_rxcui = validation.rxcui.clone().unwrap_or_default();
            row.rxnorm_name = validation.name.clone().unwrap_or_default();
            row.rxnorm_tty = validation.type_code.clone().unwrap_or_default();
            row.rxnorm_match_type = validation
                .match_kind
                .map(|kind| kind.as_str().to_string())
                .unwrap_or_default();
            row.rxnorm_search_term = validation.search_term.clone();
        }

        row
    }

    /// Status and review flag, for recomputing statistics from a file.
    ///
    /// Unknown status text counts as an error.
    pub fn outcome(&self) -> (FinalStatus, bool) {
        let status = self.final_status.parse().unwrap_or(FinalStatus::Error);
        (status, self.needs_review)
    }
}
