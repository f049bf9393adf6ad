//! Calculation result module

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy that produced an emissions figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// Spend × record-attached factor
    SpendBased,
    /// Spend × resolved factor
    SpendBasedDefaultFactor,
    /// Activity × record-attached factor
    ActivityBased,
    /// Activity × resolved factor
    ActivityBasedDefaultFactor,
    /// Spend extracted from free text
    TextExtractedSpend,
    /// Activity extracted from free text
    TextExtractedActivity,
}

impl CalculationMethod {
    /// Stable identifier stamped onto records
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationMethod::SpendBased => "spend_based",
            CalculationMethod::SpendBasedDefaultFactor => "spend_based_default_factor",
            CalculationMethod::ActivityBased => "activity_based",
            CalculationMethod::ActivityBasedDefaultFactor => "activity_based_default_factor",
            CalculationMethod::TextExtractedSpend => "text_extracted_spend",
            CalculationMethod::TextExtractedActivity => "text_extracted_activity",
        }
    }

    /// Whether the figure was derived from text extraction
    pub fn is_text_extracted(&self) -> bool {
        matches!(
            self,
            CalculationMethod::TextExtractedSpend | CalculationMethod::TextExtractedActivity
        )
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An auditable emissions figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Emissions in kg CO2e (never negative)
    pub emissions_kgco2e: f64,
    /// Strategy used
    pub method: CalculationMethod,
    /// Formula, e.g. `100 USD × 0.5 = 50.00 kg CO2e`
    pub details: String,
    /// Inputs and factor provenance
    pub metadata: serde_json::Value,
}
