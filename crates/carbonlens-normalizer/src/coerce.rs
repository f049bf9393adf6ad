//! Coerce a parsed object into classified fields
//!
//! Every accessor is total: wrong types, blanks and the string `"null"` all
//! read as absent.

use carbonlens_domain::{ClassifiedFields, ConfidenceScore, Scope};
use chrono::NaiveDate;
use serde_json::{Map, Value};

type Object = Map<String, Value>;

/// Coerce a JSON value into a finite number
///
/// Accepts numbers and numeric strings with currency symbols, thousands
/// separators and surrounding whitespace (`"$1,234.50"` → 1234.5).
///
/// # Examples
///
/// ```
/// use carbonlens_normalizer::coerce::coerce_number;
/// use serde_json::json;
///
/// assert_eq!(coerce_number(&json!("1,234.5")), Some(1234.5));
/// assert_eq!(coerce_number(&json!("$12")), Some(12.0));
/// assert_eq!(coerce_number(&json!("twelve")), None);
/// assert_eq!(coerce_number(&json!(true)), None);
/// ```
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '$' | '€' | '£' | '¥' | ' '))
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Parse a date in ISO `YYYY-MM-DD` or US `MM/DD/YYYY` form
///
/// ISO datetimes are accepted by their date prefix.
pub fn coerce_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    if let Some(prefix) = text.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(text, "%m/%d/%Y").ok()
}

/// Coerce a scope from `3`, `"3"` or `"Scope 3"`
pub fn coerce_scope(value: &Value) -> Option<Scope> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()).and_then(Scope::from_u8),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse::<u8>().ok().and_then(Scope::from_u8)
        }
        _ => None,
    }
}

/// Coerce a boolean from `true` or `"true"`/`"yes"`
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn text(object: &Object, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("null")).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(object: &Object, key: &str) -> Option<f64> {
    object.get(key).and_then(coerce_number)
}

/// Fields plus the self-reported assessment found in the payload
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    /// Classified fields with defaults applied
    pub fields: ClassifiedFields,
    /// Reported confidence, if present and numeric
    pub reported_confidence: Option<ConfidenceScore>,
    /// Reported review flag, if present
    pub reported_review: Option<bool>,
}

/// Coerce an object into `ClassifiedFields`
///
/// Confidence is read from `confidence_score` or `confidence`.
pub fn coerce_fields(object: &Object) -> Coerced {
    let defaults = ClassifiedFields::default();

    let fields = ClassifiedFields {
        supplier_name: text(object, "supplier_name").unwrap_or(defaults.supplier_name),
        activity_type: text(object, "activity_type")
            .map(|t| t.to_lowercase())
            .unwrap_or(defaults.activity_type),
        amount: number(object, "amount"),
        currency: text(object, "currency")
            .map(|c| c.to_uppercase())
            .unwrap_or(defaults.currency),
        date: object.get("date").and_then(coerce_date),
        description: text(object, "description").unwrap_or_default(),
        scope: object.get("scope").and_then(coerce_scope).unwrap_or(defaults.scope),
        category: text(object, "category").unwrap_or(defaults.category),
        subcategory: text(object, "subcategory"),
        activity_amount: number(object, "activity_amount"),
        activity_unit: text(object, "activity_unit"),
        fuel_type: text(object, "fuel_type"),
        vehicle_type: text(object, "vehicle_type"),
        distance_km: number(object, "distance_km"),
        mass_tonnes: number(object, "mass_tonnes"),
        energy_kwh: number(object, "energy_kwh"),
        reasoning: text(object, "reasoning"),
    };

    let reported_confidence = ["confidence_score", "confidence"]
        .iter()
        .find_map(|key| number(object, key))
        .map(ConfidenceScore::new);

    Coerced {
        fields,
        reported_confidence,
        reported_review: object.get("needs_human_review").and_then(coerce_bool),
    }
}
