//! End-to-end normalization tests

use carbonlens_normalizer::{normalize, NormalizeError, NormalizerConfig};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

#[test]
fn embedded_object_is_extracted_exactly() {
    let raw = "Return this JSON: {\"supplier_name\": \"Test Supplier\", \"amount\": 100, \"currency\": \"USD\"}\n\nExtra prose...";
    let payload = normalize(raw, &NormalizerConfig::default()).unwrap();

    let expected = json!({"supplier_name": "Test Supplier", "amount": 100, "currency": "USD"});
    assert_eq!(Value::Object(payload.object), expected);
    assert!(payload.repairs.is_empty());
}

#[test]
fn markdown_fenced_payload() {
    let raw = "```json\n{\n  \"supplier_name\": \"Shell\",\n  \"activity_type\": \"Transportation\",\n  \"fuel_type\": \"diesel\",\n  \"activity_amount\": \"400\",\n  \"activity_unit\": \"L\"\n}\n```";
    let payload = normalize(raw, &NormalizerConfig::default()).unwrap();

    assert_eq!(payload.fields.activity_type, "transportation");
    assert_eq!(payload.fields.activity_amount, Some(400.0));
    assert_eq!(payload.fields.fuel_type.as_deref(), Some("diesel"));
}

#[test]
fn schema_echo_with_comments_and_qualifiers() {
    let raw = r#"{
        supplier_name: "Grid Co", // from header
        amount: 1234.56,
        currency: 'USD',
        date: "01/15/2024" or null,
        confidence_score: 0.8,
        needs_human_review: False,
    }"#;
    let payload = normalize(raw, &NormalizerConfig::default()).unwrap();

    assert_eq!(payload.fields.supplier_name, "Grid Co");
    assert_eq!(payload.fields.amount, Some(1234.56));
    assert_eq!(payload.fields.date.map(|d| d.to_string()).as_deref(), Some("2024-01-15"));
    assert!(!payload.needs_human_review);
}

#[test]
fn key_equals_value_payload() {
    let raw = "{supplier_name=\"Acme\", amount=42, currency=\"GBP\"}";
    let payload = normalize(raw, &NormalizerConfig::default()).unwrap();

    assert_eq!(payload.fields.amount, Some(42.0));
    assert_eq!(payload.fields.currency, "GBP");
    assert_eq!(payload.repairs, vec!["equals_assignments"]);
}

#[test]
fn prose_only_has_no_payload() {
    let result = normalize("Sorry, the invoice is unreadable.", &NormalizerConfig::default());
    assert_eq!(result, Err(NormalizeError::NoPayload));
}

fn to_json(members: &BTreeMap<String, Value>, separator: &str) -> String {
    let body: Vec<String> = members
        .iter()
        .map(|(k, v)| format!("\"{}\": {}", k, v))
        .collect();
    format!("{{{}}}", body.join(separator))
}

/// Member values: strings that may hold braces, quotes and commas, or small nested objects
fn member_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[A-Za-z0-9 {}\",:]{0,10}".prop_map(Value::String),
        ("[a-z]{1,5}", 0u32..1000, "[A-Za-z {}\"]{0,6}")
            .prop_map(|(key, n, text)| json!({ key: n, "text": text })),
    ]
}

#[test]
fn truncated_after_nested_member_keeps_prefix() {
    let payload = normalize(
        r#"{"supplier_name": "Acme", "meta": {"page": 1}, "amount": 100, "curr"#,
        &NormalizerConfig::default(),
    )
    .unwrap();
    assert_eq!(
        Value::Object(payload.object),
        json!({"supplier_name": "Acme", "meta": {"page": 1}, "amount": 100})
    );
}

#[test]
fn truncated_with_closing_brace_in_string_keeps_prefix() {
    let payload = normalize(
        r#"{"supplier_name": "Acme}", "amount": 100, "curr"#,
        &NormalizerConfig::default(),
    )
    .unwrap();
    assert_eq!(
        Value::Object(payload.object),
        json!({"supplier_name": "Acme}", "amount": 100})
    );
}

#[test]
fn truncated_multiline_with_nested_member_keeps_prefix() {
    let raw = "{\n  \"supplier_name\": \"Acme\",\n  \"meta\": {\"page\": 1},\n  \"amount\": 100,\n  \"curr";
    let payload = normalize(raw, &NormalizerConfig::default()).unwrap();
    assert_eq!(
        Value::Object(payload.object),
        json!({"supplier_name": "Acme", "meta": {"page": 1}, "amount": 100})
    );
}

#[test]
fn apostrophe_in_single_quoted_value() {
    let payload = normalize("{'description': 'Driver's log', 'amount': 12}", &NormalizerConfig::default()).unwrap();
    assert_eq!(payload.fields.description, "Driver's log");
    assert_eq!(payload.fields.amount, Some(12.0));
}

proptest! {
    #[test]
    fn prose_around_payload_is_ignored(
        before in "[A-Za-z .,!?]{0,40}",
        after in "[A-Za-z .,!?]{0,40}",
        amount in 0u32..1_000_000,
    ) {
        let raw = format!("{}{{\"amount\": {}}}{}", before, amount, after);
        let payload = normalize(&raw, &NormalizerConfig::default()).unwrap();
        prop_assert_eq!(payload.fields.amount, Some(amount as f64));
    }

    #[test]
    fn truncation_keeps_a_prefix_of_members(
        members in prop::collection::btree_map("[a-z_]{1,8}", member_value(), 1..6),
        multiline in any::<bool>(),
        cut_fraction in 0.0f64..1.0,
    ) {
        let full = to_json(&members, if multiline { ",\n  " } else { ", " });
        let cut = 1 + ((full.len() - 1) as f64 * cut_fraction) as usize;
        let payload = normalize(&full[..cut], &NormalizerConfig::default()).unwrap();

        let expected: Map<String, Value> = members
            .iter()
            .take(payload.object.len())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        prop_assert_eq!(payload.object, expected);
    }

    #[test]
    fn confidence_always_in_unit_interval(reported in -1e6f64..1e6) {
        let raw = format!("{{\"confidence_score\": {}}}", reported);
        let payload = normalize(&raw, &NormalizerConfig::default()).unwrap();
        let score = payload.confidence_score.value();
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn review_forced_below_any_threshold(
        reported in 0.0f64..1.0,
        threshold in 0.0f64..1.0,
    ) {
        let raw = format!("{{\"confidence_score\": {}, \"needs_human_review\": false}}", reported);
        let payload = normalize(&raw, &NormalizerConfig::with_threshold(threshold)).unwrap();
        if payload.confidence_score.value() < threshold {
            prop_assert!(payload.needs_human_review);
        } else {
            prop_assert!(!payload.needs_human_review);
        }
    }
}
