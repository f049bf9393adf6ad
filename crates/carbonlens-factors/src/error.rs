//! Error types for factor catalogs and resolution

use thiserror::Error;

/// Errors that can occur during catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Row or input that does not describe a valid factor
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Errors that can occur while resolving a factor
///
/// Absence of a factor is never an error; only a failing catalog is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactorError {
    /// Catalog lookup failed
    #[error("Catalog error: {0}")]
    Catalog(String),
}
