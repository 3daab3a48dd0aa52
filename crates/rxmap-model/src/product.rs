//! Normalized product attributes extracted from one source row.

use serde::{Deserialize, Serialize};

/// Attribute bag describing one pharmaceutical product.
///
/// Every field is always present; missing source values are stored as the
/// empty string, never as an absent value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductContext {
    /// Commercial product name (`NOM`).
    pub product_name: String,
    /// Active ingredient as written in the source (`DCI1`).
    pub active_ingredient: String,
    /// Dosage amount (`DOSAGE1`).
    pub dosage_amount: String,
    /// Dosage unit (`UNITE_DOSAGE1`).
    pub dosage_unit: String,
    /// Amount and unit joined by a single space.
    pub full_dosage: String,
    /// Pharmaceutical form (`FORME`).
    pub form: String,
    /// Packaging presentation (`PRESENTATION`).
    pub presentation: String,
    /// Source product code (`CODE`).
    pub code: String,
}

impl ProductContext {
    /// True when every attribute is empty.
    pub fn is_blank(&self) -> bool {
        [
            &self.product_name,
            &self.active_ingredient,
            &self.dosage_amount,
            &self.dosage_unit,
            &self.full_dosage,
            &self.form,
            &self.presentation,
            &self.code,
        ]
        .iter()
        .all(|value| value.is_empty())
    }

    /// Short label for progress output: the product name, else the code.
    pub fn label(&self) -> &str {
        if self.product_name.is_empty() {
            &self.code
        } else {
            &self.product_name
        }
    }
}
