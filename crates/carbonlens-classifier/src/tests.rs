//! Orchestrator tests against mock backends

use crate::{Classifier, ClassifierConfig};
use carbonlens_domain::{ClassificationTier, Scope};
use carbonlens_llm::{LlmError, MockBackend};

const GOOD_PAYLOAD: &str = r#"{"supplier_name": "Shell", "activity_type": "transportation",
    "amount": 812.40, "currency": "EUR", "fuel_type": "Diesel", "activity_amount": 400,
    "activity_unit": "L", "confidence_score": 0.92, "needs_human_review": false}"#;

fn offline() -> Classifier {
    Classifier::new(ClassifierConfig::offline())
}

#[test]
fn test_local_tier_success() {
    let local = MockBackend::new(GOOD_PAYLOAD).with_name("ollama").with_model("llama3.2:latest");
    let classifier = offline().with_local(local.clone());

    let result = classifier.classify("Shell fuel receipt", None);

    assert!(result.success);
    assert_eq!(result.tier, Some(ClassificationTier::LocalModel));
    assert_eq!(result.model_used, "ollama:llama3.2:latest");
    assert!(!result.needs_human_review);

    let data = result.data.unwrap();
    assert_eq!(data.supplier_name, "Shell");
    assert_eq!(data.activity_amount, Some(400.0));
    assert_eq!(data.scope, Scope::Three);
    assert_eq!(local.probe_count(), 1);
    assert_eq!(local.call_count(), 1);
}

#[test]
fn test_unreachable_local_falls_to_cloud() {
    let local = MockBackend::unreachable().with_name("ollama");
    let cloud = MockBackend::new(GOOD_PAYLOAD).with_name("openai").with_model("gpt-3.5-turbo");
    let classifier = offline().with_local(local.clone()).with_cloud(cloud.clone());

    let result = classifier.classify("Shell fuel receipt", None);

    assert_eq!(result.tier, Some(ClassificationTier::CloudModel));
    assert_eq!(result.model_used, "openai:gpt-3.5-turbo");
    assert_eq!(local.call_count(), 0, "unreachable tier must not be invoked");
    assert_eq!(cloud.call_count(), 1);

    let attempts = result.metadata["tier_attempts"].as_array().unwrap();
    assert_eq!(attempts[0]["outcome"], "unreachable");
    assert_eq!(attempts[1]["outcome"], "succeeded");
}

#[test]
fn test_garbage_output_falls_through() {
    let local = MockBackend::new("I am unable to read this invoice.");
    let cloud = MockBackend::new("{amount: 1 2 3}");
    let classifier = offline().with_local(local).with_cloud(cloud);

    let result = classifier.classify("Total: $1,234.56", None);

    assert!(result.success);
    assert_eq!(result.tier, Some(ClassificationTier::Patterns));
    assert_eq!(result.model_used, "patterns:fallback");
    assert_eq!(result.data.unwrap().amount, Some(1234.56));

    let attempts = result.metadata["tier_attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[0]["outcome"], "invalid_output");
    assert_eq!(attempts[1]["outcome"], "invalid_output");
}

#[test]
fn test_generation_error_is_not_retried() {
    let mut local = MockBackend::default();
    local.add_error("Invoice", LlmError::Timeout(30));
    let classifier = offline().with_local(local.clone());

    let result = classifier.classify("slow request", None);

    assert_eq!(result.tier, Some(ClassificationTier::Patterns));
    assert_eq!(local.call_count(), 1);
    assert_eq!(result.metadata["tier_attempts"][0]["outcome"], "generation_failed");
}

#[test]
fn test_low_confidence_forces_review() {
    let local = MockBackend::new(r#"{"amount": 10, "confidence_score": 0.4, "needs_human_review": false}"#);
    let classifier = offline().with_local(local);

    let result = classifier.classify("x", None);
    assert_eq!(result.tier, Some(ClassificationTier::LocalModel));
    assert!(result.needs_human_review);
}

#[test]
fn test_threshold_comes_from_config() {
    let mut config = ClassifierConfig::offline();
    config.confidence_threshold = 0.95;
    let local = MockBackend::new(r#"{"confidence_score": 0.9, "needs_human_review": false}"#);
    let classifier = Classifier::new(config).with_local(local);

    assert!(classifier.classify("x", None).needs_human_review);
}

#[test]
fn test_no_tiers_uses_patterns() {
    let result = offline().classify("Vendor: Acme\nRecycling pickup\nTotal: 45", None);

    assert_eq!(result.tier, Some(ClassificationTier::Patterns));
    let data = result.data.unwrap();
    assert_eq!(data.supplier_name, "Acme");
    assert_eq!(data.activity_type, "waste");
    assert_eq!(result.metadata["tier_attempts"][0]["outcome"], "skipped");
}

#[test]
fn test_prompt_is_truncated() {
    let mut config = ClassifierConfig::offline();
    config.max_text_length = 10;
    let mut local = MockBackend::new("not json");
    local.add_response("0123456789X", GOOD_PAYLOAD);
    let classifier = Classifier::new(config).with_local(local);

    // The eleventh char never reaches the backend
    let result = classifier.classify("0123456789XYZ", None);
    assert_eq!(result.tier, Some(ClassificationTier::Patterns));
}

#[test]
fn test_supplier_hint_reaches_prompt() {
    let mut local = MockBackend::new("not json");
    local.add_response("Supplier: Known Co", GOOD_PAYLOAD);
    let classifier = offline().with_local(local);

    let result = classifier.classify("receipt", Some("Known Co"));
    assert_eq!(result.tier, Some(ClassificationTier::LocalModel));
}

#[test]
fn test_classify_many_preserves_order() {
    let mut local = MockBackend::new("no");
    local.add_response("first", r#"{"supplier_name": "One", "confidence_score": 0.9}"#);
    local.add_response("second", r#"{"supplier_name": "Two", "confidence_score": 0.9}"#);
    let classifier = offline().with_local(local);

    let results = classifier.classify_many(&["first", "second", "third"], &[None, Some("Hint")]);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].data.as_ref().unwrap().supplier_name, "One");
    assert_eq!(results[1].data.as_ref().unwrap().supplier_name, "Two");
    assert_eq!(results[2].tier, Some(ClassificationTier::Patterns));
}

#[test]
fn test_tier_availability() {
    let classifier = offline().with_local(MockBackend::unreachable());
    let report = classifier.tier_availability();

    assert_eq!(report.len(), 3);
    assert!(!report[0].available);
    assert!(report[0].error.is_some());
    assert_eq!(report[1].backend, "none");
    assert!(report[2].available);
}

#[test]
fn test_from_config_without_cloud_key() {
    let mut config = ClassifierConfig::default();
    config.cloud = Some(Default::default());
    let classifier = Classifier::from_config(config).unwrap();

    let report = classifier.tier_availability();
    assert_eq!(report[1].backend, "none");
}
