//! Error types for the Classifier

use carbonlens_llm::LlmError;
use thiserror::Error;

/// Errors raised while building a classifier
///
/// Classification itself never fails; these only come from setup.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A backend could not be constructed
    #[error("Backend error: {0}")]
    Backend(#[from] LlmError),
}
