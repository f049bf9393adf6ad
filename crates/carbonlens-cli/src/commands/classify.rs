//! Classify command implementation.

use super::{read_source, require_text};
use crate::cli::ClassifyArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use carbonlens_classifier::Classifier;

/// Execute the classify command.
pub fn execute_classify(args: ClassifyArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let input = match args.text {
        Some(text) => Some(text),
        None => read_source(args.file.as_deref(), args.stdin)?,
    };
    let text = require_text(input, "text to classify")?;

    let classifier = Classifier::from_config(config.classifier.clone())?;
    let result = classifier.classify(&text, args.supplier.as_deref());

    println!("{}", formatter.format_classification(&result)?);
    Ok(())
}
