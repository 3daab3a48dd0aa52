//! Mapping instruction sent to the language model.

use rxmap_model::ProductContext;

/// System role for every completion request.
pub const SYSTEM_PROMPT: &str = "You are a pharmaceutical expert specializing in RxNorm mapping. \
                                 Always respond with valid JSON only.";

/// Render the mapping instruction for one product.
///
/// The reply contract lists exactly the keys read back by
/// [`crate::parse_proposal`].
pub fn compose_prompt(product: &ProductContext) -> String {
    format!(
        r#"You are a pharmaceutical expert specializing in drug standardization and RxNorm mapping. Your task is to map a Moroccan medical product to the most appropriate RxNorm concept.

PRODUCT INFORMATION:
- Product Name: {name}
- Active Ingredient (DCI): {ingredient}
- Dosage: {dosage}
- Pharmaceutical Form: {form}
- Presentation: {presentation}
- Product Code: {code}

INSTRUCTIONS:
1. Analyze the product information carefully
2. Consider standard pharmaceutical naming conventions
3. Account for French/Arabic to English translation needs (e.g. "comprimé" is "Oral Tablet", "gélule" is "Oral Capsule")
4. Translate the active ingredient to its English INN/generic name
5. Map to the most specific appropriate RxNorm concept level (preferably SCD - Semantic Clinical Drug)
6. Provide confidence based on how well the mapping matches

RESPONSE FORMAT (JSON only):
{{
    "primary_rxnorm_concept": "exact concept name for RxNorm search",
    "confidence_score": <1-10>,
    "alternative_concepts": [
        "alternative concept 1",
        "alternative concept 2"
    ],
    "mapping_strategy": "brief explanation of mapping approach",
    "dosage_standardized": "standardized dosage format",
    "form_standardized": "standardized form",
    "active_ingredient_english": "English name of active ingredient",
    "reasoning": "detailed reasoning for this mapping"
}}

Focus on creating searchable terms that will work with RxNorm API. Consider:
- Generic vs brand name preferences
- Standard dosage unit conversions (mg, ml, etc.)
- Common pharmaceutical form terminology
- Active ingredient standard names (INN/generic names)

Respond only with valid JSON."#,
        name = product.product_name,
        ingredient = product.active_ingredient,
        dosage = product.full_dosage,
        form = product.form,
        presentation = product.presentation,
        code = product.code,
    )
}
