//! Error types for calculation and uncertainty quantification

use carbonlens_factors::FactorError;
use thiserror::Error;

/// Errors that can occur while calculating a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    /// No strategy could be applied
    #[error(
        "Unable to calculate emissions: insufficient data. Required: either (amount + currency) \
         or (activity_amount) or (energy_kwh) or (distance_km, optionally with mass_tonnes) \
         or free text (description, notes or source_text) for extraction [{}]",
        .reasons.join("; ")
    )]
    InsufficientData {
        /// Why each strategy was not applicable, in strategy order
        reasons: Vec<String>,
    },

    /// Factor catalog failed
    #[error(transparent)]
    Catalog(#[from] FactorError),
}

/// Errors that can occur during uncertainty quantification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UncertaintyError {
    /// Confidence level outside (0, 1)
    #[error("Confidence level must be strictly between 0 and 1, got {0}")]
    InvalidConfidenceLevel(f64),

    /// Non-finite amount or factor, or negative uncertainty
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Fuel factor lookup failed
    #[error(transparent)]
    Factor(#[from] FactorError),
}
