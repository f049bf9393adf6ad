//! Calculation resolver: picks the first strategy that applies to a record

use crate::error::CalculationError;
use crate::strategy::{activity_based, spend_based, StrategyOutcome};
use carbonlens_domain::traits::{FactorCatalog, RecordEnricher, TextClassifier};
use carbonlens_domain::{
    ActivityRecord, CalculationMethod, CalculationResult, ClassificationResult,
};
use carbonlens_factors::FactorResolver;
use serde_json::json;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// A text classifier usable for the extraction strategy
pub type DynClassifier = Box<dyn TextClassifier + Send + Sync>;

/// A post-calculation enricher
pub type DynEnricher = Box<dyn RecordEnricher + Send + Sync>;

/// What `calculate_if_missing` did to a record
#[derive(Debug, Clone, PartialEq)]
pub enum Calculation {
    /// Emissions were already present; the record is untouched
    AlreadyCalculated,
    /// Emissions were computed and stamped onto the record
    Computed(CalculationResult),
}

/// Turns records into emissions figures
///
/// Strategies are tried in a fixed order: spend-based, activity-based, then
/// text extraction. The first that applies wins. Enrichers run only after a
/// successful calculation and cannot fail it.
pub struct CalculationResolver<C> {
    factors: FactorResolver<C>,
    classifier: Option<DynClassifier>,
    enrichers: Vec<DynEnricher>,
}

impl<C> CalculationResolver<C>
where
    C: FactorCatalog,
    C::Error: Display,
{
    /// Create a resolver without text extraction or enrichers
    pub fn new(factors: FactorResolver<C>) -> Self {
        Self {
            factors,
            classifier: None,
            enrichers: Vec::new(),
        }
    }

    /// Enable the text-extraction strategy
    pub fn with_classifier(mut self, classifier: impl TextClassifier + Send + Sync + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Register an enricher; enrichers run in registration order
    pub fn with_enricher(mut self, enricher: impl RecordEnricher + Send + Sync + 'static) -> Self {
        self.enrichers.push(Box::new(enricher));
        self
    }

    /// The factor resolver in use
    pub fn factors(&self) -> &FactorResolver<C> {
        &self.factors
    }

    /// Calculate emissions unless the record already has them
    ///
    /// # Examples
    ///
    /// ```
    /// use carbonlens_calculator::{Calculation, CalculationResolver};
    /// use carbonlens_domain::ActivityRecord;
    /// use carbonlens_factors::FactorResolver;
    ///
    /// let resolver = CalculationResolver::new(FactorResolver::with_defaults());
    /// let mut record = ActivityRecord::spend(100.0, "USD");
    ///
    /// let first = resolver.calculate_if_missing(&mut record).unwrap();
    /// assert!(matches!(first, Calculation::Computed(_)));
    /// assert_eq!(record.emissions_kgco2e, Some(50.0));
    ///
    /// let second = resolver.calculate_if_missing(&mut record).unwrap();
    /// assert_eq!(second, Calculation::AlreadyCalculated);
    /// ```
    pub fn calculate_if_missing(
        &self,
        record: &mut ActivityRecord,
    ) -> Result<Calculation, CalculationError> {
        if record.is_calculated() {
            debug!("record {} already calculated", record.id);
            return Ok(Calculation::AlreadyCalculated);
        }

        let mut reasons = Vec::with_capacity(3);
        let strategies: [(&str, StrategyFn<C>); 3] = [
            ("spend", Self::try_spend),
            ("activity", Self::try_activity),
            ("text", Self::try_text),
        ];

        for (name, strategy) in strategies {
            match strategy(self, record)? {
                StrategyOutcome::Applied(result) => {
                    info!(
                        "record {} calculated via {} strategy: {:.2} kg CO2e ({})",
                        record.id, name, result.emissions_kgco2e, result.method
                    );
                    record.apply_calculation(&result);
                    self.run_enrichers(record);
                    return Ok(Calculation::Computed(result));
                }
                StrategyOutcome::NotApplicable(reason) => {
                    debug!("record {}: {}", record.id, reason);
                    reasons.push(reason);
                }
            }
        }

        Err(CalculationError::InsufficientData { reasons })
    }

    fn try_spend(&self, record: &ActivityRecord) -> Result<StrategyOutcome, CalculationError> {
        Ok(spend_based(record, &self.factors)?)
    }

    fn try_activity(&self, record: &ActivityRecord) -> Result<StrategyOutcome, CalculationError> {
        Ok(activity_based(record, &self.factors)?)
    }

    fn try_text(&self, record: &ActivityRecord) -> Result<StrategyOutcome, CalculationError> {
        let Some(text) = record.free_text() else {
            return Ok(StrategyOutcome::NotApplicable(
                "text: no description, notes or source_text".to_string(),
            ));
        };
        let Some(classifier) = &self.classifier else {
            return Ok(StrategyOutcome::NotApplicable(
                "text: no text classifier configured".to_string(),
            ));
        };

        let classification = classifier.classify(text, record.supplier_name.as_deref());
        let Some(fields) = classification.data.as_ref().filter(|_| classification.success) else {
            let error = classification.error.as_deref().unwrap_or("no data extracted");
            return Ok(StrategyOutcome::NotApplicable(format!("text: classification failed: {}", error)));
        };

        // Only extracted data feeds the calculation
        let extracted = ActivityRecord::from_classified(fields);

        let (outcome, method) = match spend_based(&extracted, &self.factors)? {
            StrategyOutcome::Applied(result) => (result, CalculationMethod::TextExtractedSpend),
            StrategyOutcome::NotApplicable(_) => match activity_based(&extracted, &self.factors)? {
                StrategyOutcome::Applied(result) => (result, CalculationMethod::TextExtractedActivity),
                StrategyOutcome::NotApplicable(_) => {
                    return Ok(StrategyOutcome::NotApplicable(
                        "text: extracted data has no usable amounts".to_string(),
                    ));
                }
            },
        };

        Ok(StrategyOutcome::Applied(text_extracted(outcome, method, &classification)))
    }

    fn run_enrichers(&self, record: &mut ActivityRecord) {
        for enricher in &self.enrichers {
            if let Err(e) = enricher.enrich(record) {
                warn!("enricher {} failed for record {}: {}", enricher.name(), record.id, e);
            }
        }
    }
}

type StrategyFn<C> =
    fn(&CalculationResolver<C>, &ActivityRecord) -> Result<StrategyOutcome, CalculationError>;

fn text_extracted(
    mut result: CalculationResult,
    method: CalculationMethod,
    classification: &ClassificationResult,
) -> CalculationResult {
    result.method = method;
    result.details = format!("Text extracted: {}", result.details);
    result.metadata["type"] = json!(method.as_str());
    result.metadata["extracted_data"] = json!(classification.data);
    result.metadata["classification"] = json!({
        "model_used": classification.model_used,
        "tier": classification.tier,
        "confidence_score": classification.confidence_score,
        "needs_human_review": classification.needs_human_review,
    });
    result
}
