//! Classification result module

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::confidence::ConfidenceScore;
use crate::record::Scope;

/// Source that produced a classification
///
/// Tiers are tried in declaration order; `Patterns` cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationTier {
    /// Locally hosted model service
    LocalModel,
    /// Cloud model service
    CloudModel,
    /// Deterministic pattern matching
    Patterns,
}

impl ClassificationTier {
    /// Stable identifier used in logs and metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationTier::LocalModel => "local_model",
            ClassificationTier::CloudModel => "cloud_model",
            ClassificationTier::Patterns => "patterns",
        }
    }
}

impl fmt::Display for ClassificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial record fields extracted from text
///
/// Enumerable fields carry their defaults once coerced; numeric fields stay
/// `None` when the source value was absent or not numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedFields {
    /// Supplier name ("Unknown Supplier" when absent)
    pub supplier_name: String,
    /// Activity classification ("other" when absent)
    pub activity_type: String,
    /// Monetary amount
    pub amount: Option<f64>,
    /// Currency code ("USD" when absent)
    pub currency: String,
    /// Activity date
    pub date: Option<NaiveDate>,
    /// Short description
    pub description: String,
    /// GHG scope (3 when absent)
    pub scope: Scope,
    /// Spend category ("Other" when absent)
    pub category: String,
    /// Spend subcategory
    pub subcategory: Option<String>,
    /// Physical activity quantity
    pub activity_amount: Option<f64>,
    /// Unit of the activity quantity
    pub activity_unit: Option<String>,
    /// Fuel type
    pub fuel_type: Option<String>,
    /// Vehicle type
    pub vehicle_type: Option<String>,
    /// Distance in km
    pub distance_km: Option<f64>,
    /// Mass in tonnes
    pub mass_tonnes: Option<f64>,
    /// Energy in kWh
    pub energy_kwh: Option<f64>,
    /// Model-reported reasoning, if any
    pub reasoning: Option<String>,
}

impl Default for ClassifiedFields {
    fn default() -> Self {
        Self {
            supplier_name: "Unknown Supplier".to_string(),
            activity_type: "other".to_string(),
            amount: None,
            currency: "USD".to_string(),
            date: None,
            description: String::new(),
            scope: Scope::Three,
            category: "Other".to_string(),
            subcategory: None,
            activity_amount: None,
            activity_unit: None,
            fuel_type: None,
            vehicle_type: None,
            distance_km: None,
            mass_tonnes: None,
            energy_kwh: None,
            reasoning: None,
        }
    }
}

/// Outcome of classifying one text
///
/// Immutable once built. `needs_human_review` is derived from the score and
/// the configured threshold by whoever constructs the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Whether structured data was produced
    pub success: bool,

    /// Extracted fields (absent on failure)
    pub data: Option<ClassifiedFields>,

    /// Clamped confidence
    pub confidence_score: ConfidenceScore,

    /// Whether a human must confirm the data
    pub needs_human_review: bool,

    /// Backend and model identifier, e.g. `ollama:llama3.2:latest`
    pub model_used: String,

    /// Tier that produced the result
    pub tier: Option<ClassificationTier>,

    /// Failure description
    pub error: Option<String>,

    /// Audit metadata (raw response, extraction method, tier attempts)
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ClassificationResult {
    /// Build a successful result
    pub fn success(
        data: ClassifiedFields,
        confidence_score: ConfidenceScore,
        needs_human_review: bool,
        model_used: impl Into<String>,
        tier: ClassificationTier,
    ) -> Self {
        Self {
            success: true,
            data: Some(data),
            confidence_score,
            needs_human_review,
            model_used: model_used.into(),
            tier: Some(tier),
            error: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Build a failed result
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        let mut metadata = serde_json::Map::new();
        metadata.insert("error".to_string(), serde_json::Value::String(error.clone()));
        metadata.insert(
            "extraction_method".to_string(),
            serde_json::Value::String("error".to_string()),
        );

        Self {
            success: false,
            data: None,
            confidence_score: ConfidenceScore::ZERO,
            needs_human_review: true,
            model_used: "error".to_string(),
            tier: None,
            error: Some(error),
            metadata,
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
