use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use rxmap_llm::{
    Completion, CompletionClient, CompletionRequest, ConceptProposer, LlmError, OpenAiSettings,
    SYSTEM_PROMPT, parse_proposal,
};
use rxmap_model::ProductContext;

/// Replays a canned reply and records every request.
struct CannedClient {
    reply: Result<String, u16>,
    requests: Rc<RefCell<Vec<CompletionRequest>>>,
}

impl CompletionClient for CannedClient {
    fn complete(&self, request: &CompletionRequest) -> rxmap_llm::Result<Completion> {
        self.requests.borrow_mut().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(Completion {
                text: text.clone(),
                total_tokens: 410,
            }),
            Err(status) => Err(LlmError::Api {
                status: *status,
                message: "upstream unavailable".to_string(),
            }),
        }
    }
}

fn proposer(reply: Result<String, u16>) -> (ConceptProposer, Rc<RefCell<Vec<CompletionRequest>>>) {
    let requests = Rc::new(RefCell::new(Vec::new()));
    let client = CannedClient {
        reply,
        requests: Rc::clone(&requests),
    };
    (
        ConceptProposer::new(Box::new(client), OpenAiSettings::default()),
        requests,
    )
}

fn augmentin() -> ProductContext {
    ProductContext {
        product_name: "AUGMENTIN".into(),
        active_ingredient: "AMOXICILLINE".into(),
        dosage_amount: "1".into(),
        dosage_unit: "g".into(),
        full_dosage: "1 g".into(),
        form: "comprimé pelliculé".into(),
        presentation: "Boite de 12".into(),
        code: "6118000020025".into(),
    }
}

#[test]
fn fenced_reply_becomes_proposal() {
    let reply = "```json\n{\"primary_rxnorm_concept\": \"amoxicillin 1000 MG Oral Tablet\", \
                 \"confidence_score\": 8, \"alternative_concepts\": [\"amoxicillin 1000 MG\"]}\n```";
    let (proposer, requests) = proposer(Ok(reply.to_string()));

    let proposal = proposer.propose(&augmentin());

    assert_eq!(
        proposal.primary_concept.as_deref(),
        Some("amoxicillin 1000 MG Oral Tablet")
    );
    assert_eq!(proposal.confidence_score, 8);
    assert_eq!(proposal.tokens_used, 410);
    let raw = proposal.raw_response.as_deref().unwrap();
    assert!(raw.starts_with('{') && raw.ends_with('}'));

    let requests = requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].system, SYSTEM_PROMPT);
    assert_eq!(requests[0].model, "gpt-4");
    assert_eq!(requests[0].max_tokens, 800);
    assert!(requests[0].prompt.contains("AMOXICILLINE"));
}

#[test]
fn service_error_has_no_raw_response() {
    let (proposer, _) = proposer(Err(503));
    let proposal = proposer.propose(&augmentin());
    assert!(proposal.primary_concept.is_none());
    assert_eq!(proposal.confidence_score, 0);
    assert_eq!(
        proposal.error.as_deref(),
        Some("completion API error (503): upstream unavailable")
    );
    assert!(proposal.raw_response.is_none());
}

#[test]
fn prose_reply_is_a_parse_failure() {
    let (proposer, _) = proposer(Ok("I think this is amoxicillin.".to_string()));
    let proposal = proposer.propose(&augmentin());
    assert!(proposal.primary_concept.is_none());
    assert!(
        proposal
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("JSON parsing failed"))
    );
    assert_eq!(
        proposal.raw_response.as_deref(),
        Some("I think this is amoxicillin.")
    );
}

proptest! {
    #[test]
    fn confidence_always_in_range(score in -1000.0f64..1000.0) {
        let raw = format!(r#"{{"primary_rxnorm_concept": "x", "confidence_score": {score}}}"#);
        let proposal = parse_proposal(&raw, 0);
        prop_assert!(proposal.confidence_score <= 10);
    }

    #[test]
    fn unmapped_proposals_have_zero_confidence(text in "\\PC{0,40}") {
        let proposal = parse_proposal(&text, 0);
        if proposal.primary_concept.is_none() {
            prop_assert_eq!(proposal.confidence_score, 0);
            prop_assert!(proposal.error.is_some());
        }
    }
}
