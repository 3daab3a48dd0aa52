//! Per-product mapping records and their lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::product::ProductContext;
use crate::proposal::ConceptProposal;
use crate::validation::ValidationResult;

/// Error attached to the validation slot when the model stage yields nothing.
pub const AI_MAPPING_FAILED: &str = "AI mapping failed";

/// How far a record progressed through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Started,
    AiCompleted,
    Completed,
    Error,
}

impl ProcessingStage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::AiCompleted => "ai_completed",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStage {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "started" => Ok(Self::Started),
            "ai_completed" => Ok(Self::AiCompleted),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(ModelError::UnknownStage(other.to_string())),
        }
    }
}

/// Terminal outcome of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    /// A proposed concept was validated against the terminology service.
    Success,
    /// The model proposed concepts but none validated.
    Failed,
    /// The model stage produced no primary concept.
    AiFailed,
    /// An unexpected failure aborted the record.
    Error,
}

impl FinalStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::AiFailed => "ai_failed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinalStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "ai_failed" => Ok(Self::AiFailed),
            "error" => Ok(Self::Error),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// Everything known about one product after it went through the pipeline.
///
/// Records move forward through consuming transitions; a record that never
/// reaches a terminal transition reports as [`FinalStatus::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Row index in the source table.
    pub index: usize,
    pub original: ProductContext,
    pub timestamp: DateTime<Local>,
    pub processing_stage: ProcessingStage,
    pub proposal: Option<ConceptProposal>,
    pub validation: Option<ValidationResult>,
    pub final_status: FinalStatus,
    pub needs_review: bool,
    pub error_message: Option<String>,
}

impl MappingRecord {
    /// New record for `index`, stamped with the current local time.
    pub fn started(index: usize, original: ProductContext) -> Self {
        Self {
            index,
            original,
            timestamp: Local::now(),
            processing_stage: ProcessingStage::Started,
            proposal: None,
            validation: None,
            final_status: FinalStatus::Error,
            needs_review: true,
            error_message: None,
        }
    }

    /// Attach the model proposal.
    #[must_use]
    pub fn with_proposal(mut self, proposal: ConceptProposal) -> Self {
        self.proposal = Some(proposal);
        self.processing_stage = ProcessingStage::AiCompleted;
        self
    }

    /// Finish a record whose proposal has no primary concept.
    #[must_use]
    pub fn into_ai_failed(mut self) -> Self {
        self.validation = Some(ValidationResult::not_found("", AI_MAPPING_FAILED));
        self.final_status = FinalStatus::AiFailed;
        self.needs_review = true;
        self
    }

    /// Finish a record with its validation outcome.
    ///
    /// Successful records still need review when the proposal confidence is
    /// below `review_threshold`.
    #[must_use]
    pub fn into_validated(mut self, validation: ValidationResult, review_threshold: u8) -> Self {
        let confidence = self
            .proposal
            .as_ref()
            .map_or(0, |proposal| proposal.confidence_score);
        if validation.found {
            self.final_status = FinalStatus::Success;
            self.needs_review = confidence < review_threshold;
        } else {
            self.final_status = FinalStatus::Failed;
            self.needs_review = true;
        }
        self.validation = Some(validation);
        self.processing_stage = ProcessingStage::Completed;
        self
    }

    /// Abort the record after an unexpected failure.
    #[must_use]
    pub fn into_error(mut self, message: String) -> Self {
        self.processing_stage = ProcessingStage::Error;
        self.final_status = FinalStatus::Error;
        self.needs_review = true;
        self.error_message = Some(message);
        self
    }

    /// Error text worth showing for this record, from whichever stage failed.
    pub fn error_detail(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .or_else(|| self.proposal.as_ref().and_then(|p| p.error.as_deref()))
            .or_else(|| {
                self.validation
                    .as_ref()
                    .filter(|v| !v.found)
                    .and_then(|v| v.error.as_deref())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(confidence: u8) -> ConceptProposal {
        ConceptProposal {
            primary_concept: Some("paracetamol 500 MG Oral Tablet".into()),
            confidence_score: confidence,
            ..ConceptProposal::default()
        }
    }

    #[test]
    fn validated_low_confidence_needs_review() {
        let hit = ValidationResult::exact("x", "198440", "acetaminophen 500 MG Oral Tablet", None);
        let record = MappingRecord::started(0, ProductContext::default())
            .with_proposal(proposal(6))
            .into_validated(hit.clone(), 7);
        assert_eq!(record.final_status, FinalStatus::Success);
        assert!(record.needs_review);

        let record = MappingRecord::started(0, ProductContext::default())
            .with_proposal(proposal(7))
            .into_validated(hit, 7);
        assert!(!record.needs_review);
        assert_eq!(record.processing_stage, ProcessingStage::Completed);
    }

    #[test]
    fn ai_failed_keeps_stage() {
        let record = MappingRecord::started(1, ProductContext::default())
            .with_proposal(ConceptProposal::failed("timeout", None))
            .into_ai_failed();
        assert_eq!(record.processing_stage, ProcessingStage::AiCompleted);
        assert_eq!(record.final_status, FinalStatus::AiFailed);
        let validation = record.validation.as_ref().unwrap();
        assert!(!validation.found);
        assert_eq!(validation.error.as_deref(), Some(AI_MAPPING_FAILED));
        assert_eq!(record.error_detail(), Some("timeout"));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            FinalStatus::Success,
            FinalStatus::Failed,
            FinalStatus::AiFailed,
            FinalStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<FinalStatus>().unwrap(), status);
        }
        assert!("pending".parse::<FinalStatus>().is_err());
    }
}
