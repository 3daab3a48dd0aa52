//! RxNorm terminology lookups.
//!
//! # Lookup order
//!
//! 1. **Exact**: `drugs.json?name=` and pick a concept by preferred term type
//! 2. **Approximate**: `approximateTerm.json?term=` when the exact search
//!    yields nothing
//!
//! Candidates are tried in rank order; the first validated one wins.

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod types;
pub mod validator;

pub use client::{RxNavClient, RxNavSettings, TerminologyService};
pub use error::{Result, RxNormError};
pub use types::{
    ApproximateCandidate, ApproximateResponse, ConceptGroup, ConceptProperties, DrugsResponse,
    PREFERRED_TERM_TYPES, TermType,
};
pub use validator::{EMPTY_CONCEPT_NAME, TerminologyValidator};
