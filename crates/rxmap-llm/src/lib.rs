//! Language-model stage of the mapping pipeline.
//!
//! - [`prompt`] renders a product into the mapping instruction
//! - [`client`] talks to an OpenAI-compatible chat completion endpoint
//! - [`proposer`] turns the reply into a [`rxmap_model::ConceptProposal`]

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod prompt;
pub mod proposer;

pub use client::{
    Completion, CompletionClient, CompletionRequest, OpenAiClient, OpenAiSettings,
};
pub use error::{LlmError, Result};
pub use prompt::{SYSTEM_PROMPT, compose_prompt};
pub use proposer::{ConceptProposer, parse_proposal, strip_code_fence};
