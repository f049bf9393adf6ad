//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Classifier setup error
    #[error("Classifier error: {0}")]
    Classifier(#[from] carbonlens_classifier::ClassifierError),

    /// Factor catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] carbonlens_factors::CatalogError),

    /// Uncertainty quantification error
    #[error("Uncertainty error: {0}")]
    Uncertainty(#[from] carbonlens_calculator::UncertaintyError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
