//! Context building: one source row to a [`ProductContext`].

use rxmap_model::ProductContext;

use crate::table::SourceRow;

pub const COL_NAME: &str = "NOM";
pub const COL_INGREDIENT: &str = "DCI1";
pub const COL_DOSAGE: &str = "DOSAGE1";
pub const COL_DOSAGE_UNIT: &str = "UNITE_DOSAGE1";
pub const COL_FORM: &str = "FORME";
pub const COL_PRESENTATION: &str = "PRESENTATION";
pub const COL_CODE: &str = "CODE";

/// Columns the pipeline reads from every product row.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_NAME,
    COL_INGREDIENT,
    COL_DOSAGE,
    COL_DOSAGE_UNIT,
    COL_FORM,
    COL_PRESENTATION,
    COL_CODE,
];

/// Spreadsheet exports write missing cells as one of these tokens.
const MISSING_MARKERS: [&str; 4] = ["nan", "none", "null", "nat"];

/// True for cell text that stands for a missing value.
pub fn is_missing_marker(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

fn cell(row: &SourceRow, column: &str) -> String {
    match row.get(column) {
        Some(value) if !is_missing_marker(value) => value.trim().to_string(),
        _ => String::new(),
    }
}

fn join_dosage(amount: &str, unit: &str) -> String {
    format!("{amount} {unit}").trim().to_string()
}

/// Build the product context for one row. Never fails: absent columns and
/// missing markers become empty strings.
pub fn build_product_context(row: &SourceRow) -> ProductContext {
    let dosage_amount = cell(row, COL_DOSAGE);
    let dosage_unit = cell(row, COL_DOSAGE_UNIT);
    let full_dosage = join_dosage(&dosage_amount, &dosage_unit);
    ProductContext {
        product_name: cell(row, COL_NAME),
        active_ingredient: cell(row, COL_INGREDIENT),
        dosage_amount,
        dosage_unit,
        full_dosage,
        form: cell(row, COL_FORM),
        presentation: cell(row, COL_PRESENTATION),
        code: cell(row, COL_CODE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> SourceRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn builds_trimmed_context() {
        let ctx = build_product_context(&row(&[
            ("NOM", "  DOLIPRANE "),
            ("DCI1", "PARACETAMOL"),
            ("DOSAGE1", "500"),
            ("UNITE_DOSAGE1", "mg "),
            ("FORME", "comprimé"),
            ("PRESENTATION", "Boite de 16"),
            ("CODE", "6118000010217"),
        ]));
        assert_eq!(ctx.product_name, "DOLIPRANE");
        assert_eq!(ctx.full_dosage, "500 mg");
        assert_eq!(ctx.form, "comprimé");
        assert_eq!(ctx.code, "6118000010217");
    }

    #[test]
    fn full_dosage_with_one_side_missing() {
        let ctx = build_product_context(&row(&[("UNITE_DOSAGE1", "mg")]));
        assert_eq!(ctx.full_dosage, "mg");
        let ctx = build_product_context(&row(&[("DOSAGE1", "250"), ("UNITE_DOSAGE1", "NaN")]));
        assert_eq!(ctx.full_dosage, "250");
        assert_eq!(ctx.dosage_unit, "");
    }

    #[test]
    fn absent_columns_become_empty() {
        let ctx = build_product_context(&SourceRow::new());
        assert!(ctx.is_blank());
    }
}
