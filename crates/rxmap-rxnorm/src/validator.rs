//! Candidate validation against RxNorm.

use tracing::{debug, info_span, warn};

use rxmap_model::ValidationResult;

use crate::client::TerminologyService;
use crate::error::Result;

/// Error for a blank candidate.
pub const EMPTY_CONCEPT_NAME: &str = "Empty concept name";

/// Error when the candidate list has nothing to search.
pub const NO_CANDIDATES: &str = "No candidate concepts to validate";

/// Validates proposed concept names, exact lookup first.
pub struct TerminologyValidator {
    service: Box<dyn TerminologyService>,
    max_approximate_entries: u32,
}

impl TerminologyValidator {
    pub fn new(service: Box<dyn TerminologyService>, max_approximate_entries: u32) -> Self {
        Self {
            service,
            max_approximate_entries,
        }
    }

    /// Look up one concept name. Failures come back as not-found values.
    pub fn search_concept(&self, concept_name: &str) -> ValidationResult {
        let name = concept_name.trim();
        if name.is_empty() {
            return ValidationResult::not_found("", EMPTY_CONCEPT_NAME);
        }

        let _span = info_span!("search_concept", concept = %name).entered();
        match self.lookup(name) {
            Ok(Some(result)) => result,
            Ok(None) => {
                debug!("no RxNorm match");
                ValidationResult::not_found(name, format!("No results found for: {name}"))
            }
            Err(err) => {
                warn!(error = %err, "RxNorm lookup failed");
                ValidationResult::not_found(name, err.to_string())
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Option<ValidationResult>> {
        if let Some(drugs) = self.service.find_drugs(name)?
            && let Some((group, concept)) = drugs.preferred_concept()
        {
            debug!(rxcui = %concept.rxcui, "exact match");
            return Ok(Some(ValidationResult::exact(
                name,
                concept.rxcui.clone(),
                concept.name.clone(),
                group.type_code_for(concept),
            )));
        }

        let approximate = self
            .service
            .approximate_term(name, self.max_approximate_entries)?;
        Ok(approximate.and_then(|response| {
            response.best_candidate().map(|(rxcui, found_name, score)| {
                debug!(%rxcui, ?score, "approximate match");
                ValidationResult::approximate(name, rxcui, found_name, score)
            })
        }))
    }

    /// Try `candidates` in order and return the first match.
    ///
    /// When nothing matches, the first candidate's not-found result is
    /// returned. A blank candidate counts as a miss without a lookup.
    pub fn validate_candidates(&self, candidates: &[String]) -> ValidationResult {
        let mut first_miss: Option<ValidationResult> = None;

        for candidate in candidates {
            let result = self.search_concept(candidate);
            if result.found {
                return result;
            }
            first_miss.get_or_insert(result);
        }

        first_miss.unwrap_or_else(|| ValidationResult::not_found("", NO_CANDIDATES))
    }
}
