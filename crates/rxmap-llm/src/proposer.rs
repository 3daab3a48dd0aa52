//! Concept proposals from the language model.
//!
//! The proposer never fails: malformed replies and service errors come back
//! as a [`ConceptProposal::failed`] value so the pipeline can keep going.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use rxmap_model::{CONFIDENCE_MAX, CONFIDENCE_MIN, ConceptProposal, ProductContext};

use crate::client::{CompletionClient, CompletionRequest, OpenAiSettings};
use crate::prompt::{SYSTEM_PROMPT, compose_prompt};

/// Error recorded when a parsed reply lacks the primary concept.
pub const MISSING_PRIMARY: &str = "response has no primary_rxnorm_concept";

/// Remove a Markdown code fence wrapped around the reply.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix("```json") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim()
}

/// Reply schema. Missing keys default; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProposalReply {
    #[serde(deserialize_with = "lenient_text")]
    primary_rxnorm_concept: String,
    #[serde(deserialize_with = "lenient_score")]
    confidence_score: u8,
    #[serde(deserialize_with = "lenient_list")]
    alternative_concepts: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    mapping_strategy: String,
    #[serde(deserialize_with = "lenient_text")]
    dosage_standardized: String,
    #[serde(deserialize_with = "lenient_text")]
    form_standardized: String,
    #[serde(deserialize_with = "lenient_text")]
    active_ingredient_english: String,
    #[serde(deserialize_with = "lenient_text")]
    reasoning: String,
}

fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

/// Leading number of `text`, so `"8/10"` reads as 8.
fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let end = trimmed
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return CONFIDENCE_MIN;
    }
    score
        .round()
        .clamp(f64::from(CONFIDENCE_MIN), f64::from(CONFIDENCE_MAX)) as u8
}

fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => leading_number(&text),
        _ => None,
    };
    Ok(score.map_or(CONFIDENCE_MIN, clamp_score))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<String> = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(value_text).collect(),
        Value::Null => Vec::new(),
        single => vec![value_text(single)],
    };
    Ok(items.into_iter().filter(|item| !item.is_empty()).collect())
}

/// Parse a cleaned reply into a proposal.
///
/// Invalid JSON gives a failed proposal carrying `raw`; a reply without a
/// primary concept keeps its metadata but is still a failure.
pub fn parse_proposal(raw: &str, tokens_used: u64) -> ConceptProposal {
    let reply: ProposalReply = match serde_json::from_str(raw) {
        Ok(reply) => reply,
        Err(err) => {
            let mut failed =
                ConceptProposal::failed(format!("JSON parsing failed: {err}"), Some(raw.into()));
            failed.tokens_used = tokens_used;
            return failed;
        }
    };

    let mut proposal = if reply.primary_rxnorm_concept.is_empty() {
        ConceptProposal::failed(MISSING_PRIMARY, Some(raw.to_string()))
    } else {
        ConceptProposal {
            primary_concept: Some(reply.primary_rxnorm_concept),
            confidence_score: reply.confidence_score,
            alternative_concepts: reply.alternative_concepts,
            raw_response: Some(raw.to_string()),
            ..ConceptProposal::default()
        }
    };
    proposal.mapping_strategy = reply.mapping_strategy;
    proposal.dosage_standardized = reply.dosage_standardized;
    proposal.form_standardized = reply.form_standardized;
    proposal.active_ingredient_english = reply.active_ingredient_english;
    proposal.reasoning = reply.reasoning;
    proposal.tokens_used = tokens_used;
    proposal
}

/// Asks the completion service for a concept per product.
pub struct ConceptProposer {
    client: Box<dyn CompletionClient>,
    settings: OpenAiSettings,
}

impl ConceptProposer {
    pub fn new(client: Box<dyn CompletionClient>, settings: OpenAiSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }

    /// Propose a concept for `product`.
    pub fn propose(&self, product: &ProductContext) -> ConceptProposal {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            prompt: compose_prompt(product),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let completion = match self.client.complete(&request) {
            Ok(completion) => completion,
            Err(err) => {
                warn!(error = %err, retryable = err.is_retryable(), "completion request failed");
                return ConceptProposal::failed(err.to_string(), None);
            }
        };

        let cleaned = strip_code_fence(&completion.text);
        let proposal = parse_proposal(cleaned, completion.total_tokens);
        match &proposal.error {
            Some(error) => warn!(%error, "model reply not usable"),
            None => debug!(
                confidence = proposal.confidence_score,
                alternatives = proposal.alternative_concepts.len(),
                tokens = proposal.tokens_used,
                "model proposal parsed"
            ),
        }
        proposal
    }
}
