//! carbonlens Classifier
//!
//! Turns free text (invoice text, OCR output, notes) into a classification
//! result by trying a chain of tiers.
//!
//! # Architecture
//!
//! ```text
//! text → local model → cloud model → patterns
//!            │              │
//!            └──── normalizer (repair + validate) ────→ ClassificationResult
//! ```
//!
//! Every path ends in a result: a failing model tier hands over to the next,
//! and the pattern tier cannot fail.
//!
//! # Example Usage
//!
//! ```
//! use carbonlens_classifier::{Classifier, ClassifierConfig};
//! use carbonlens_llm::MockBackend;
//!
//! let local = MockBackend::new(r#"{"supplier_name": "Acme", "amount": 120, "confidence_score": 0.9}"#);
//! let classifier = Classifier::new(ClassifierConfig::offline()).with_local(local);
//!
//! let result = classifier.classify("Acme invoice, total 120", None);
//! assert!(result.success);
//! assert_eq!(result.model_used, "mock:mock-model");
//! ```

#![warn(missing_docs)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod patterns;
pub mod prompt;

#[cfg(test)]
mod tests;

pub use classifier::{Classifier, DynBackend, TierAttempt, TierAvailability};
pub use config::ClassifierConfig;
pub use error::ClassifierError;
pub use patterns::PatternClassifier;
pub use prompt::PromptBuilder;
