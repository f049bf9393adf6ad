//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the core and its collaborators.
//! Implementations live in other crates.

use crate::{ActivityRecord, ClassificationResult, EmissionFactor, FactorQuery};

/// A request sent to a generation backend
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Optional system prompt (ignored by backends without roles)
    pub system_prompt: Option<String>,
    /// User prompt
    pub prompt: String,
}

impl GenerationRequest {
    /// Request with only a user prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
        }
    }

    /// Attach a system prompt
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Text produced by a generation backend
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Raw generated text
    pub text: String,
    /// Model that produced it
    pub model: String,
}

/// Trait for generation backends (local or cloud model services)
///
/// Implemented by the infrastructure layer (carbonlens-llm). Calls block
/// for at most the backend's configured timeout.
pub trait GenerationBackend {
    /// Error type for backend operations
    type Error;

    /// Short backend name used in `model_used` tags (`ollama`, `openai`)
    fn name(&self) -> &str;

    /// Liveness probe; returns the models the backend can serve
    fn probe(&self) -> Result<Vec<String>, Self::Error>;

    /// Generate text for a request
    fn generate(&self, request: &GenerationRequest) -> Result<Generation, Self::Error>;
}

/// Trait for read-only emission factor catalogs
///
/// Implemented by the infrastructure layer (carbonlens-factors)
pub trait FactorCatalog {
    /// Error type for catalog operations
    type Error;

    /// Find the best single row for a query, or none
    fn find(&self, query: &FactorQuery) -> Result<Option<EmissionFactor>, Self::Error>;
}

/// Trait for turning free text into a classification
///
/// Implemented by the application layer (carbonlens-classifier). Never fails:
/// every path ends in a result object.
pub trait TextClassifier {
    /// Classify one text, optionally with a known supplier name
    fn classify(&self, text: &str, supplier_hint: Option<&str>) -> ClassificationResult;
}

/// Trait for post-calculation enrichment (sector mapping, compliance scoring)
///
/// Enrichers run only after a successful calculation and write into
/// `ActivityRecord::extensions`. Their failures never fail the calculation.
pub trait RecordEnricher {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Enrich the record in place
    fn enrich(&self, record: &mut ActivityRecord) -> Result<(), String>;
}

impl<T: TextClassifier + ?Sized> TextClassifier for &T {
    fn classify(&self, text: &str, supplier_hint: Option<&str>) -> ClassificationResult {
        (**self).classify(text, supplier_hint)
    }
}

impl<T: FactorCatalog + ?Sized> FactorCatalog for &T {
    type Error = T::Error;

    fn find(&self, query: &FactorQuery) -> Result<Option<EmissionFactor>, Self::Error> {
        (**self).find(query)
    }
}
