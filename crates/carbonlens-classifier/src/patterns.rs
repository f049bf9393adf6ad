//! Deterministic pattern tier
//!
//! The last tier. It cannot fail: every field has a default, so a result is
//! always produced, always at low confidence and always flagged for review.

use carbonlens_domain::{
    ClassificationResult, ClassificationTier, ClassifiedFields, ConfidenceScore,
};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// `model_used` tag for pattern results
pub const MODEL_TAG: &str = "patterns:fallback";

/// Maximum description length in characters before an ellipsis is added
pub const DESCRIPTION_LIMIT: usize = 200;

static SUPPLIER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Bill\s+to:\s*([^\n]+)",
        r"(?i)From:\s*([^\n]+)",
        r"(?i)Supplier:\s*([^\n]+)",
        r"(?i)Vendor:\s*([^\n]+)",
        r"(?i)Company:\s*([^\n]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static AMOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Total:\s*[$€£]?\s*([\d,]+\.?\d*)",
        r"(?i)Amount:\s*[$€£]?\s*([\d,]+\.?\d*)",
        r"(?i)Cost:\s*[$€£]?\s*([\d,]+\.?\d*)",
        r"\$\s*([\d,]+\.?\d*)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static DATE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\b(\d{4}-\d{2}-\d{2})\b", "%Y-%m-%d"),
        (r"\b(\d{2}/\d{2}/\d{4})\b", "%m/%d/%Y"),
        (r"\b(\d{2}-\d{2}-\d{4})\b", "%m-%d-%Y"),
        (r"\b(\d{1,2}/\d{1,2}/\d{4})\b", "%m/%d/%Y"),
    ]
    .iter()
    .map(|(p, f)| (Regex::new(p).expect("valid regex"), *f))
    .collect()
});

/// Keyword lists per activity type, checked in order
const ACTIVITY_KEYWORDS: &[(&str, &[&str])] = &[
    ("transportation", &["transport", "shipping", "delivery", "fuel", "gas", "mileage"]),
    ("energy", &["electricity", "energy", "power", "kwh", "electric"]),
    ("waste", &["waste", "disposal", "recycling", "trash"]),
    ("materials", &["material", "supplies", "equipment", "goods"]),
];

/// Pattern-based field extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl PatternClassifier {
    /// Create a new pattern classifier
    pub fn new() -> Self {
        Self
    }

    /// Extract fields from text; a non-blank supplier hint wins
    pub fn extract(&self, text: &str, supplier_hint: Option<&str>) -> ClassifiedFields {
        let defaults = ClassifiedFields::default();

        let supplier_name = supplier_hint
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| extract_supplier(text))
            .unwrap_or(defaults.supplier_name);

        ClassifiedFields {
            supplier_name,
            activity_type: classify_activity(text).to_string(),
            amount: extract_amount(text),
            currency: detect_currency(text).to_string(),
            date: extract_date(text),
            description: summarize(text),
            ..defaults
        }
    }

    /// Produce a complete pattern-tier result
    pub fn classify(&self, text: &str, supplier_hint: Option<&str>) -> ClassificationResult {
        let fields = self.extract(text, supplier_hint);
        ClassificationResult::success(
            fields,
            ConfidenceScore::PATTERN_MATCH,
            true,
            MODEL_TAG,
            ClassificationTier::Patterns,
        )
        .with_metadata("extraction_method", json!("patterns"))
    }
}

/// First supplier line match, in pattern order
pub fn extract_supplier(text: &str) -> Option<String> {
    SUPPLIER_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// First amount match that parses, commas stripped
pub fn extract_amount(text: &str) -> Option<f64> {
    AMOUNT_PATTERNS.iter().find_map(|pattern| {
        pattern.captures_iter(text).find_map(|c| {
            let digits = c.get(1)?.as_str().replace(',', "");
            digits.parse::<f64>().ok().filter(|v| v.is_finite())
        })
    })
}

/// Currency from symbols or codes, defaulting to USD
pub fn detect_currency(text: &str) -> &'static str {
    let upper = text.to_uppercase();
    if text.contains('$') {
        "USD"
    } else if text.contains('€') || upper.contains("EUR") {
        "EUR"
    } else if text.contains('£') || upper.contains("GBP") {
        "GBP"
    } else {
        "USD"
    }
}

/// First date match that is a real calendar date
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    DATE_PATTERNS.iter().find_map(|(pattern, format)| {
        pattern
            .captures_iter(text)
            .find_map(|c| NaiveDate::parse_from_str(c.get(1)?.as_str(), format).ok())
    })
}

/// Keyword activity classification
pub fn classify_activity(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    ACTIVITY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(activity, _)| *activity)
        .unwrap_or("other")
}

/// Leading text, truncated with an ellipsis
pub fn summarize(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(DESCRIPTION_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbonlens_domain::Scope;

    #[test]
    fn test_total_with_thousands_separator() {
        let fields = PatternClassifier::new().extract("Total: $1,234.56", None);
        assert_eq!(fields.amount, Some(1234.56));
        assert_eq!(fields.currency, "USD");
    }

    #[test]
    fn test_amount_pattern_order() {
        assert_eq!(extract_amount("Cost: 50\nTotal: 75"), Some(75.0));
        assert_eq!(extract_amount("Paid $19.99 today"), Some(19.99));
        assert_eq!(extract_amount("no numbers"), None);
    }

    #[test]
    fn test_supplier_lines() {
        assert_eq!(
            extract_supplier("INVOICE\nVendor: Acme Freight Ltd\nTotal: 10").as_deref(),
            Some("Acme Freight Ltd")
        );
        assert_eq!(
            extract_supplier("From: Grid Power\nBill to: Example Corp").as_deref(),
            Some("Example Corp")
        );
        assert_eq!(extract_supplier("nothing here"), None);
    }

    #[test]
    fn test_supplier_hint_wins() {
        let fields = PatternClassifier::new().extract("Vendor: Acme", Some("Known Co"));
        assert_eq!(fields.supplier_name, "Known Co");

        let fields = PatternClassifier::new().extract("no supplier", None);
        assert_eq!(fields.supplier_name, "Unknown Supplier");
    }

    #[test]
    fn test_currency_detection() {
        assert_eq!(detect_currency("€ 40"), "EUR");
        assert_eq!(detect_currency("40 gbp"), "GBP");
        assert_eq!(detect_currency("40"), "USD");
    }

    #[test]
    fn test_dates() {
        assert_eq!(extract_date("Date: 2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(extract_date("Issued 03/15/2024"), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(extract_date("Issued 03-15-2024"), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(extract_date("Issued 3/5/2024"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(extract_date("2024-13-45"), None);
    }

    #[test]
    fn test_activity_keywords() {
        assert_eq!(classify_activity("Diesel FUEL delivery"), "transportation");
        assert_eq!(classify_activity("Monthly electricity, 320 kWh"), "energy");
        assert_eq!(classify_activity("Recycling pickup"), "waste");
        assert_eq!(classify_activity("Office supplies"), "materials");
        assert_eq!(classify_activity("Consulting"), "other");
    }

    #[test]
    fn test_description_truncation() {
        let long = "x".repeat(250);
        let summary = summarize(&long);
        assert_eq!(summary.chars().count(), DESCRIPTION_LIMIT + 3);
        assert!(summary.ends_with("..."));
        assert_eq!(summarize(" short "), "short");
    }

    #[test]
    fn test_result_shape() {
        let result = PatternClassifier::new().classify("Total: $10", None);
        assert!(result.success);
        assert!(result.needs_human_review);
        assert_eq!(result.confidence_score, ConfidenceScore::PATTERN_MATCH);
        assert_eq!(result.model_used, MODEL_TAG);
        assert_eq!(result.tier, Some(ClassificationTier::Patterns));

        let data = result.data.unwrap();
        assert_eq!(data.scope, Scope::Three);
        assert_eq!(data.category, "Other");
    }
}
