//! End-to-end calculation tests: classifier, factor catalog and resolver

use carbonlens_calculator::{quantify, summarize, Calculation, CalculationResolver};
use carbonlens_classifier::{Classifier, ClassifierConfig};
use carbonlens_domain::{ActivityRecord, EmissionFactor, Scope};
use carbonlens_factors::{FactorResolver, ResolverConfig, SqliteCatalog};
use carbonlens_llm::MockBackend;
use proptest::prelude::*;

fn resolver_with_catalog() -> CalculationResolver<SqliteCatalog> {
    let mut catalog = SqliteCatalog::new(":memory:").unwrap();
    catalog
        .insert(&EmissionFactor {
            activity_category: "shipping".to_string(),
            scope: Scope::Three,
            region: None,
            description: Some("Tanker, VLSFO".to_string()),
            value: 3.151,
            unit: "kg CO2e/kg fuel".to_string(),
            uncertainty_pct: 2.0,
            source: "IMO".to_string(),
            version: Some("2023".to_string()),
        })
        .unwrap();
    CalculationResolver::new(FactorResolver::new(catalog, ResolverConfig::default()))
}

#[test]
fn text_record_classified_by_local_model() {
    let local = MockBackend::new(
        r#"Here you go: {"supplier_name": "Maersk", "activity_type": "transportation",
        "activity_amount": 2000, "activity_unit": "kg", "fuel_type": "VLSFO",
        "amount": null, "currency": "USD", "confidence_score": 0.88}"#,
    )
    .with_name("ollama");
    let classifier = Classifier::new(ClassifierConfig::offline()).with_local(local);
    let resolver = CalculationResolver::new(FactorResolver::with_defaults()).with_classifier(classifier);

    let mut record = ActivityRecord {
        source_text: Some("Maersk bunker delivery note: 2 t VLSFO".to_string()),
        ..ActivityRecord::default()
    };

    let Calculation::Computed(result) = resolver.calculate_if_missing(&mut record).unwrap() else {
        panic!("expected a computed result");
    };

    assert_eq!(record.calculation_method.as_deref(), Some("text_extracted_activity"));
    assert!((result.emissions_kgco2e - 2000.0 * 3.151).abs() < 1e-6);
    assert_eq!(result.metadata["classification"]["tier"], "local_model");
    assert_eq!(result.metadata["factor"]["source"], "IMO");
}

#[test]
fn catalog_fuel_factor_is_specific() {
    let resolver = resolver_with_catalog();
    let mut record = ActivityRecord::activity(1000.0, "Tanker voyage");
    record.fuel_type = Some("VLSFO".to_string());

    resolver.calculate_if_missing(&mut record).unwrap();

    assert_eq!(record.calculation_method.as_deref(), Some("activity_based"));
    assert_eq!(
        record.calculation_metadata.as_ref().unwrap()["factor"]["origin"],
        "catalog"
    );
}

#[test]
fn batch_then_summary() {
    let resolver = resolver_with_catalog();
    let outcome = resolver.calculate_many(vec![
        ActivityRecord::spend(100.0, "USD"),
        ActivityRecord::spend(100.0, "GBP"),
        ActivityRecord::new(),
    ]);

    let summary = summarize(&outcome.calculated);
    assert_eq!(summary.calculated_records, 2);
    assert!((summary.total_emissions_kgco2e - 105.0).abs() < 1e-9);
    assert_eq!(summary.calculation_methods["spend_based_default_factor"], 2);
    assert_eq!(outcome.failed.len(), 1);
}

#[test]
fn uncertainty_is_reproducible() {
    let first = quantify(1000.0, 3.0, 10.0, 0.95).unwrap();
    let second = quantify(1000.0, 3.0, 10.0, 0.95).unwrap();
    assert_eq!(first.lower_bound, second.lower_bound);
    assert_eq!(first.upper_bound, second.upper_bound);
    assert_eq!(first.base_emissions, 3000.0);
}

proptest! {
    #[test]
    fn spend_wins_when_both_present(amount in 1.0f64..1e6, activity in 1.0f64..1e6) {
        let mut record = ActivityRecord::spend(amount, "USD");
        record.activity_amount = Some(activity);
        record.activity_type = Some("energy".to_string());

        let resolver = CalculationResolver::new(FactorResolver::with_defaults());
        resolver.calculate_if_missing(&mut record).unwrap();

        prop_assert_eq!(record.calculation_method.as_deref(), Some("spend_based_default_factor"));
        prop_assert!((record.emissions_kgco2e.unwrap() - amount * 0.5).abs() < 1e-6);
    }

    #[test]
    fn recalculation_is_a_no_op(amount in 1.0f64..1e6, existing in 0.0f64..1e6) {
        let mut record = ActivityRecord::spend(amount, "EUR");
        record.emissions_kgco2e = Some(existing);
        let before = record.clone();

        let resolver = CalculationResolver::new(FactorResolver::with_defaults());
        let outcome = resolver.calculate_if_missing(&mut record).unwrap();

        prop_assert_eq!(outcome, Calculation::AlreadyCalculated);
        prop_assert_eq!(record, before);
    }

    #[test]
    fn interval_brackets_base(amount in 1.0f64..1e5, factor in 0.01f64..10.0, pct in 0.0f64..50.0) {
        let estimate = quantify(amount, factor, pct, 0.9).unwrap();
        prop_assert!(estimate.lower_bound <= estimate.upper_bound);
        prop_assert!(estimate.lower_bound <= estimate.base_emissions * (1.0 + 1e-9));
        prop_assert!(estimate.upper_bound >= estimate.base_emissions * (1.0 - 1e-9));
    }
}
