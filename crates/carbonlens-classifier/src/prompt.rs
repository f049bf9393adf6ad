//! Prompt construction for model tiers

use carbonlens_domain::traits::GenerationRequest;

/// System prompt sent to backends that support roles
pub const SYSTEM_PROMPT: &str =
    "You are an expert at extracting carbon emission data from invoices and financial documents.";

/// Compact single-line schema the model is asked to fill
pub const SCHEMA_EXAMPLE: &str = r#"{"supplier_name": "Test Supplier", "activity_type": "transportation", "amount": 100, "currency": "USD", "date": "2024-01-15", "description": "Diesel fuel", "activity_amount": null, "activity_unit": null, "fuel_type": null, "confidence_score": 0.8}"#;

/// Allowed `activity_type` values
pub const ACTIVITY_TYPES: &[&str] = &["transportation", "energy", "waste", "materials", "other"];

/// Builds the extraction prompt for one text
pub struct PromptBuilder<'a> {
    text: &'a str,
    supplier_hint: Option<&'a str>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            supplier_hint: None,
        }
    }

    /// Add a known supplier name
    pub fn with_supplier_hint(mut self, supplier_hint: Option<&'a str>) -> Self {
        self.supplier_hint = supplier_hint.filter(|s| !s.trim().is_empty());
        self
    }

    /// Build the user prompt
    pub fn build_prompt(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str("Return this JSON: ");
        prompt.push_str(SCHEMA_EXAMPLE);
        prompt.push_str("\n\n");
        prompt.push_str(&format!("activity_type is one of: {}.\n", ACTIVITY_TYPES.join(", ")));
        prompt.push_str("Use null for unknown values. Respond with the JSON object only.\n\n");

        if let Some(supplier) = self.supplier_hint {
            prompt.push_str(&format!("Supplier: {}\n", supplier));
        }

        prompt.push_str("Invoice: ");
        prompt.push_str(self.text);
        prompt
    }

    /// Build the full request
    pub fn build(&self) -> GenerationRequest {
        GenerationRequest::new(self.build_prompt()).with_system_prompt(SYSTEM_PROMPT)
    }
}

/// Truncate `text` to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
