//! RxNav response schemas and RxNorm term types.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// RxNorm term types (TTY) seen in `drugs.json` concept groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermType {
    /// IN
    Ingredient,
    /// PIN
    PreciseIngredient,
    /// MIN
    MultipleIngredients,
    /// SCDC
    ClinicalDrugComponent,
    /// SCDF
    ClinicalDrugForm,
    /// SCD
    ClinicalDrug,
    /// BN
    BrandName,
    /// SBDC
    BrandedDrugComponent,
    /// SBDF
    BrandedDrugForm,
    /// SBD
    BrandedDrug,
    /// GPCK
    GenericPack,
    /// BPCK
    BrandedPack,
}

/// Term types tried in order when picking the concept for a name.
pub const PREFERRED_TERM_TYPES: [TermType; 4] = [
    TermType::ClinicalDrug,
    TermType::GenericPack,
    TermType::ClinicalDrugComponent,
    TermType::BrandName,
];

impl TermType {
    pub fn code(&self) -> &'static str {
        match self {
            TermType::Ingredient => "IN",
            TermType::PreciseIngredient => "PIN",
            TermType::MultipleIngredients => "MIN",
            TermType::ClinicalDrugComponent => "SCDC",
            TermType::ClinicalDrugForm => "SCDF",
            TermType::ClinicalDrug => "SCD",
            TermType::BrandName => "BN",
            TermType::BrandedDrugComponent => "SBDC",
            TermType::BrandedDrugForm => "SBDF",
            TermType::BrandedDrug => "SBD",
            TermType::GenericPack => "GPCK",
            TermType::BrandedPack => "BPCK",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "IN" => Some(TermType::Ingredient),
            "PIN" => Some(TermType::PreciseIngredient),
            "MIN" => Some(TermType::MultipleIngredients),
            "SCDC" => Some(TermType::ClinicalDrugComponent),
            "SCDF" => Some(TermType::ClinicalDrugForm),
            "SCD" => Some(TermType::ClinicalDrug),
            "BN" => Some(TermType::BrandName),
            "SBDC" => Some(TermType::BrandedDrugComponent),
            "SBDF" => Some(TermType::BrandedDrugForm),
            "SBD" => Some(TermType::BrandedDrug),
            "GPCK" => Some(TermType::GenericPack),
            "BPCK" => Some(TermType::BrandedPack),
            _ => None,
        }
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// drugs.json
// ============================================================================

/// Body of `GET /drugs.json?name=`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrugsResponse {
    pub drug_group: DrugGroup,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrugGroup {
    pub name: Option<String>,
    pub concept_group: Vec<ConceptGroup>,
}

/// Concepts sharing one term type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConceptGroup {
    pub tty: Option<String>,
    pub concept_properties: Vec<ConceptProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConceptProperties {
    pub rxcui: String,
    pub name: String,
    pub tty: Option<String>,
    pub synonym: Option<String>,
}

impl DrugsResponse {
    /// Pick the concept for this lookup.
    ///
    /// The first concept of the first group whose type is in
    /// [`PREFERRED_TERM_TYPES`] wins, in that order; otherwise the first
    /// concept of the first non-empty group.
    pub fn preferred_concept(&self) -> Option<(&ConceptGroup, &ConceptProperties)> {
        let groups = &self.drug_group.concept_group;

        for preferred in PREFERRED_TERM_TYPES {
            let hit = groups
                .iter()
                .filter(|group| group.tty.as_deref() == Some(preferred.code()))
                .find_map(first_concept);
            if hit.is_some() {
                return hit;
            }
        }

        groups.iter().find_map(first_concept)
    }
}

fn first_concept(group: &ConceptGroup) -> Option<(&ConceptGroup, &ConceptProperties)> {
    group
        .concept_properties
        .first()
        .map(|concept| (group, concept))
}

impl ConceptGroup {
    /// Term type of `concept`, falling back to the group's.
    pub fn type_code_for(&self, concept: &ConceptProperties) -> Option<String> {
        concept
            .tty
            .clone()
            .or_else(|| self.tty.clone())
            .filter(|tty| !tty.is_empty())
    }
}

// ============================================================================
// approximateTerm.json
// ============================================================================

/// Body of `GET /approximateTerm.json?term=`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApproximateResponse {
    pub approximate_group: ApproximateGroup,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApproximateGroup {
    pub input_term: Option<String>,
    pub candidate: Vec<ApproximateCandidate>,
}

/// One ranked suggestion. RxNav sends numbers as strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApproximateCandidate {
    pub rxcui: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub score: Option<f64>,
    pub rank: Option<String>,
    pub source: Option<String>,
}

impl ApproximateResponse {
    /// Highest-ranked candidate carrying both an RxCUI and a name.
    pub fn best_candidate(&self) -> Option<(&str, &str, Option<f64>)> {
        self.approximate_group.candidate.iter().find_map(|c| {
            let rxcui = c.rxcui.as_deref().filter(|v| !v.is_empty())?;
            let name = c.name.as_deref().filter(|v| !v.is_empty())?;
            Some((rxcui, name, c.score))
        })
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}
