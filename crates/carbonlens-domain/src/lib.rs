//! carbonlens Domain Layer
//!
//! This crate contains the data model shared by every other carbonlens crate:
//! activity records, classification results, emission factors, calculation
//! results and uncertainty estimates, plus the trait seams through which the
//! core talks to generation backends, factor catalogs and enrichers.
//!
//! ## Key Concepts
//!
//! - **ActivityRecord**: One emitting event, enriched in place by calculation
//! - **ClassificationResult**: The structured outcome of classifying one text
//! - **ConfidenceScore**: A score that is always within [0, 1]
//! - **EmissionFactor**: A catalog row converting spend or activity into CO2e
//! - **CalculationResult**: An auditable emissions figure with provenance
//!
//! ## Architecture
//!
//! Only value types and traits live here. Backends, catalogs and the
//! resolvers are implemented in the infrastructure and application crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calculation;
pub mod classification;
pub mod confidence;
pub mod factor;
pub mod record;
pub mod traits;
pub mod uncertainty;

// Re-exports for convenience
pub use calculation::{CalculationMethod, CalculationResult};
pub use classification::{ClassificationResult, ClassificationTier, ClassifiedFields};
pub use confidence::ConfidenceScore;
pub use factor::{EmissionFactor, FactorOrigin, FactorQuery, ResolvedFactor};
pub use record::{ActivityRecord, RecordId, Scope};
pub use uncertainty::UncertaintyEstimate;
