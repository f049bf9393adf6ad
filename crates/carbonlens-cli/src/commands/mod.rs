//! Command implementations.

pub mod backends;
pub mod calculate;
pub mod classify;
pub mod factors;
pub mod uncertainty;

pub use self::backends::execute_backends;
pub use self::calculate::execute_calculate;
pub use self::classify::execute_classify;
pub use self::factors::execute_factors;
pub use self::uncertainty::execute_uncertainty;

use crate::config::Config;
use crate::error::{CliError, Result};
use carbonlens_factors::SqliteCatalog;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Read command input from a file, stdin, or neither.
pub(crate) fn read_source(file: Option<&Path>, stdin: bool) -> Result<Option<String>> {
    if let Some(path) = file {
        return Ok(Some(fs::read_to_string(path)?));
    }
    if stdin {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(Some(buffer));
    }
    Ok(None)
}

/// Open the configured factor catalog, creating it on first use.
pub(crate) fn open_catalog(config: &Config) -> Result<SqliteCatalog> {
    let path = config.catalog_path()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    tracing::debug!("opening factor catalog at {}", path.display());
    Ok(SqliteCatalog::new(&path)?)
}

/// Reject blank input with a message naming what was expected.
pub(crate) fn require_text(input: Option<String>, what: &str) -> Result<String> {
    match input {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(CliError::InvalidInput(format!("No {} provided", what))),
    }
}
