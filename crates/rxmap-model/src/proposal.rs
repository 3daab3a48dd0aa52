//! Concept proposals returned by the language model stage.

use serde::{Deserialize, Serialize};

/// Lowest confidence score a proposal may carry.
pub const CONFIDENCE_MIN: u8 = 0;
/// Highest confidence score a proposal may carry.
pub const CONFIDENCE_MAX: u8 = 10;

/// A normalized RxNorm concept suggested for one product.
///
/// When `primary_concept` is `None` the proposal is a failure: the
/// confidence is 0 and `error` explains why. Use [`ConceptProposal::failed`]
/// to build one so the invariant holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptProposal {
    pub primary_concept: Option<String>,
    pub confidence_score: u8,
    /// Ranked fallbacks, tried after the primary concept.
    pub alternative_concepts: Vec<String>,
    pub mapping_strategy: String,
    pub dosage_standardized: String,
    pub form_standardized: String,
    pub active_ingredient_english: String,
    pub reasoning: String,
    pub tokens_used: u64,
    /// Reply text after code-fence cleanup, when one was received.
    pub raw_response: Option<String>,
    pub error: Option<String>,
}

impl ConceptProposal {
    /// Build a failed proposal.
    pub fn failed(error: impl Into<String>, raw_response: Option<String>) -> Self {
        Self {
            primary_concept: None,
            confidence_score: CONFIDENCE_MIN,
            error: Some(error.into()),
            raw_response,
            ..Self::default()
        }
    }

    /// True when the model produced a usable primary concept.
    pub fn is_mapped(&self) -> bool {
        self.primary_concept.is_some()
    }

    /// Primary concept followed by the alternatives, in rank order.
    pub fn candidates(&self) -> Vec<String> {
        let mut candidates = Vec::with_capacity(1 + self.alternative_concepts.len());
        if let Some(primary) = &self.primary_concept {
            candidates.push(primary.clone());
        }
        candidates.extend(self.alternative_concepts.iter().cloned());
        candidates
    }
}
