//! Terminology validation outcomes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Which lookup strategy produced a validated concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Exact name search.
    Exact,
    /// Similarity-ranked approximate term search.
    Approximate,
}

impl MatchKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Approximate => "approximate",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "approximate" => Ok(Self::Approximate),
            other => Err(ModelError::UnknownMatchKind(other.to_string())),
        }
    }
}

/// Result of looking up one or more candidate names.
///
/// `found == true` implies `rxcui`, `name` and `match_kind` are set; the
/// constructors are the only way this crate builds a hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub found: bool,
    pub rxcui: Option<String>,
    pub name: Option<String>,
    /// Concept type code (`tty`), e.g. `SCD`.
    pub type_code: Option<String>,
    pub search_term: String,
    pub match_kind: Option<MatchKind>,
    /// Similarity score reported by approximate search.
    pub score: Option<f64>,
    pub error: Option<String>,
}

impl ValidationResult {
    /// Concept found by exact name search.
    pub fn exact(
        search_term: impl Into<String>,
        rxcui: impl Into<String>,
        name: impl Into<String>,
        type_code: Option<String>,
    ) -> Self {
        Self {
            found: true,
            rxcui: Some(rxcui.into()),
            name: Some(name.into()),
            type_code,
            search_term: search_term.into(),
            match_kind: Some(MatchKind::Exact),
            score: None,
            error: None,
        }
    }

    /// Concept found by approximate search.
    pub fn approximate(
        search_term: impl Into<String>,
        rxcui: impl Into<String>,
        name: impl Into<String>,
        score: Option<f64>,
    ) -> Self {
        Self {
            found: true,
            rxcui: Some(rxcui.into()),
            name: Some(name.into()),
            type_code: Some(Self::APPROXIMATE_TYPE_CODE.to_string()),
            search_term: search_term.into(),
            match_kind: Some(MatchKind::Approximate),
            score,
            error: None,
        }
    }

    /// Nothing validated for `search_term`.
    pub fn not_found(search_term: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            found: false,
            search_term: search_term.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Type code recorded for approximate hits, which carry no `tty`.
    pub const APPROXIMATE_TYPE_CODE: &'static str = "APPROX";
}
