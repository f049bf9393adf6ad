//! Backends command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use carbonlens_classifier::Classifier;

/// Execute the backends command.
///
/// Probes each configured tier once; nothing is classified.
pub fn execute_backends(config: &Config, formatter: &Formatter) -> Result<()> {
    let classifier = Classifier::from_config(config.classifier.clone())?;
    println!("{}", formatter.format_availability(&classifier.tier_availability())?);
    Ok(())
}
