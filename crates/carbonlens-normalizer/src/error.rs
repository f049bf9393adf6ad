//! Error types for the Normalizer

use thiserror::Error;

/// Errors that can occur while normalizing generated text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// No object-like span anywhere in the text
    #[error("No JSON object found in response")]
    NoPayload,

    /// Candidate span could not be parsed even after repair
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// Text parsed as JSON, but not as an object
    #[error("Expected JSON object, found {0}")]
    NotAnObject(&'static str),
}
