//! carbonlens Normalizer
//!
//! Turns raw text from a generation backend into validated classified fields.
//!
//! # Pipeline
//!
//! ```text
//! raw text → locate → complete → repair → parse → (truncate → parse) → coerce
//! ```
//!
//! - **locate**: find the first object span, ignoring surrounding prose
//! - **complete**: close a truncated object, keeping only complete members
//! - **repair**: ordered, idempotent syntactic fixes (see [`repair`])
//! - **parse**: strict `serde_json` parse, with one retry after cutting the
//!   object at the first line that is not a member
//! - **coerce**: lenient typing with defaults and the review rule
//!
//! # Example Usage
//!
//! ```
//! use carbonlens_normalizer::{normalize, NormalizerConfig};
//!
//! let raw = r#"Return this JSON: {"supplier_name": "Test Supplier", "amount": 100, "currency": "USD"}
//!
//! Extra prose..."#;
//!
//! let payload = normalize(raw, &NormalizerConfig::default()).unwrap();
//! assert_eq!(payload.fields.supplier_name, "Test Supplier");
//! assert_eq!(payload.fields.amount, Some(100.0));
//! assert!(payload.needs_human_review);
//! ```

#![warn(missing_docs)]

pub mod coerce;
pub mod config;
pub mod error;
pub mod locate;
pub mod repair;
pub mod truncate;

pub use config::NormalizerConfig;
pub use error::NormalizeError;
pub use repair::{Repair, RepairPipeline};

use carbonlens_domain::{ClassifiedFields, ConfidenceScore};
use locate::Span;
use serde_json::{Map, Value};
use tracing::debug;

/// A validated payload ready to become a classification result
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPayload {
    /// Coerced fields with defaults applied
    pub fields: ClassifiedFields,

    /// Clamped confidence (0.5 when the payload reported none)
    pub confidence_score: ConfidenceScore,

    /// Whether the payload reported a confidence itself
    pub confidence_reported: bool,

    /// Review flag after applying the threshold rule
    pub needs_human_review: bool,

    /// Parsed object before coercion
    pub object: Map<String, Value>,

    /// Repair stages that changed the text
    pub repairs: Vec<&'static str>,

    /// Whether members were discarded (truncated output or trailing prose)
    pub truncated: bool,
}

/// Normalize raw generated text into classified fields
///
/// # Errors
///
/// - `NoPayload` when the text contains no object
/// - `NotAnObject` when the text is JSON of another shape
/// - `Parse` when the object cannot be parsed even after repair
pub fn normalize(raw: &str, config: &NormalizerConfig) -> Result<NormalizedPayload, NormalizeError> {
    let span = match locate::locate(raw) {
        Some(span) => span,
        None => return Err(classify_non_object(raw)),
    };

    let (parsed, completed) = match span {
        Span::Closed(text) => (parse_candidate(text)?, false),
        Span::Open(text) => {
            debug!("payload has no closing brace, completing {} chars", text.len());
            (parse_candidate(&locate::complete(text))?, true)
        }
        Span::Greedy { span, rest } => match parse_strict(span) {
            Some(parsed) => (parsed, false),
            None => {
                debug!("braces never balance, completing {} chars", rest.len());
                (parse_candidate(&locate::complete(rest))?, true)
            }
        },
    };
    let Parsed { value, repairs, cut } = parsed;
    let truncated = completed || cut;

    let object = match value {
        Value::Object(object) => object,
        other => return Err(NormalizeError::NotAnObject(json_type(&other))),
    };

    let coerced = coerce::coerce_fields(&object);
    let confidence_reported = coerced.reported_confidence.is_some();
    let confidence_score = coerced.reported_confidence.unwrap_or(ConfidenceScore::UNREPORTED);

    // Any score below the threshold forces review regardless of the self-report
    let needs_human_review = !confidence_reported
        || confidence_score.below(config.confidence_threshold)
        || coerced.reported_review.unwrap_or(true);

    Ok(NormalizedPayload {
        fields: coerced.fields,
        confidence_score,
        confidence_reported,
        needs_human_review,
        object,
        repairs,
        truncated,
    })
}

/// A candidate span that parsed
struct Parsed {
    value: Value,
    repairs: Vec<&'static str>,
    cut: bool,
}

/// Repair and parse, retrying once after cutting at the first grammar break
fn parse_candidate(candidate: &str) -> Result<Parsed, NormalizeError> {
    let repaired = RepairPipeline::standard().apply(candidate);

    match serde_json::from_str(&repaired.text) {
        Ok(value) => Ok(Parsed {
            value,
            repairs: repaired.applied,
            cut: false,
        }),
        Err(first_error) => {
            let cut = truncate::truncate_at_grammar_break(&repaired.text)
                .ok_or_else(|| NormalizeError::Parse(first_error.to_string()))?;
            debug!("retrying parse after cutting at first non-member line");
            let value =
                serde_json::from_str(&cut).map_err(|_| NormalizeError::Parse(first_error.to_string()))?;
            Ok(Parsed {
                value,
                repairs: repaired.applied,
                cut: true,
            })
        }
    }
}

/// Repair and parse without cutting
fn parse_strict(candidate: &str) -> Option<Parsed> {
    let repaired = RepairPipeline::standard().apply(candidate);
    serde_json::from_str(&repaired.text).ok().map(|value| Parsed {
        value,
        repairs: repaired.applied,
        cut: false,
    })
}

fn classify_non_object(raw: &str) -> NormalizeError {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(_)) | Err(_) => NormalizeError::NoPayload,
        Ok(other) => NormalizeError::NotAnObject(json_type(&other)),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbonlens_domain::Scope;

    fn run(raw: &str) -> Result<NormalizedPayload, NormalizeError> {
        normalize(raw, &NormalizerConfig::default())
    }

    #[test]
    fn test_clean_payload() {
        let payload = run(
            r#"{"supplier_name": "Acme", "amount": 250.0, "currency": "EUR", "scope": 2,
                "confidence_score": 0.9, "needs_human_review": false}"#,
        )
        .unwrap();
        assert_eq!(payload.fields.supplier_name, "Acme");
        assert_eq!(payload.fields.scope, Scope::Two);
        assert_eq!(payload.confidence_score.value(), 0.9);
        assert!(!payload.needs_human_review);
        assert!(payload.repairs.is_empty());
        assert!(!payload.truncated);
    }

    #[test]
    fn test_self_report_overridden_below_threshold() {
        let payload = run(r#"{"confidence_score": 0.4, "needs_human_review": false}"#).unwrap();
        assert!(payload.needs_human_review);
    }

    #[test]
    fn test_absent_confidence_defaults_and_forces_review() {
        let payload = run(r#"{"amount": 10, "needs_human_review": false}"#).unwrap();
        assert_eq!(payload.confidence_score, ConfidenceScore::UNREPORTED);
        assert!(!payload.confidence_reported);
        assert!(payload.needs_human_review);
    }

    #[test]
    fn test_repairs_python_style_payload() {
        let payload = run("{'supplier_name': 'Acme', 'amount': 12, 'paid': True, 'date': None,}").unwrap();
        assert_eq!(payload.fields.supplier_name, "Acme");
        assert_eq!(payload.fields.amount, Some(12.0));
        assert!(payload.repairs.contains(&"single_quoted_keys"));
    }

    #[test]
    fn test_trailing_prose_inside_object() {
        let raw = "{\n  \"supplier_name\": \"Acme\",\n  \"amount\": 99,\n  I hope this helps!\n}";
        let payload = run(raw).unwrap();
        assert_eq!(payload.fields.amount, Some(99.0));
        assert!(payload.truncated);
    }

    #[test]
    fn test_truncated_output() {
        let payload = run(r#"{"supplier_name": "Acme", "amount": 100, "currency": "US"#).unwrap();
        assert_eq!(payload.object.len(), 2);
        assert_eq!(payload.fields.currency, "USD");
        assert!(payload.truncated);
    }

    #[test]
    fn test_truncated_after_nested_member() {
        let payload = run(r#"{"supplier_name": "Acme", "meta": {"page": 1}, "amount": 100, "curr"#).unwrap();
        assert_eq!(payload.fields.supplier_name, "Acme");
        assert_eq!(payload.object["meta"]["page"], 1);
        assert_eq!(payload.fields.amount, Some(100.0));
        assert!(payload.truncated);
    }

    #[test]
    fn test_truncated_with_brace_inside_string() {
        let payload = run(r#"{"supplier_name": "Acme}", "amount": 100, "curr"#).unwrap();
        assert_eq!(payload.fields.supplier_name, "Acme}");
        assert_eq!(payload.fields.amount, Some(100.0));
        assert!(payload.truncated);
    }

    #[test]
    fn test_truncated_multiline_with_nested_member() {
        let raw = "{\n  \"supplier_name\": \"Acme\",\n  \"meta\": {\"page\": 1},\n  \"amount\": 100,\n  \"curr";
        let payload = run(raw).unwrap();
        assert_eq!(payload.object.len(), 3);
        assert_eq!(payload.fields.amount, Some(100.0));
    }

    #[test]
    fn test_no_payload() {
        assert_eq!(run("I cannot help with that."), Err(NormalizeError::NoPayload));
        assert_eq!(run(""), Err(NormalizeError::NoPayload));
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(run("[1, 2, 3]"), Err(NormalizeError::NotAnObject("array")));
        assert_eq!(run("42"), Err(NormalizeError::NotAnObject("number")));
    }

    #[test]
    fn test_unrepairable() {
        assert!(matches!(run("{amount: 1 2 3}"), Err(NormalizeError::Parse(_))));
    }
}
