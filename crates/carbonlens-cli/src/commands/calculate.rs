//! Calculate command implementation.

use super::{open_catalog, read_source, require_text};
use crate::cli::CalculateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use carbonlens_calculator::{summarize, CalculationResolver};
use carbonlens_classifier::Classifier;
use carbonlens_domain::ActivityRecord;
use carbonlens_factors::FactorResolver;
use tracing::info;

/// Execute the calculate command.
pub fn execute_calculate(args: CalculateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let input = require_text(read_source(args.file.as_deref(), args.stdin)?, "records (use --file or --stdin)")?;
    let records = parse_records(&input)?;

    let factors = FactorResolver::new(open_catalog(config)?, config.resolver.clone());
    let mut resolver = CalculationResolver::new(factors);
    if !args.no_extraction {
        resolver = resolver.with_classifier(Classifier::from_config(config.classifier.clone())?);
    }

    info!("calculating {} record(s)", records.len());
    let outcome = resolver.calculate_many(records);
    let summary = summarize(&outcome.calculated);

    println!("{}", formatter.format_batch(&outcome, &summary)?);
    Ok(())
}

/// Parse a JSON array of records; a single object is accepted as a batch of one.
fn parse_records(input: &str) -> Result<Vec<ActivityRecord>> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        _ => Err(CliError::InvalidInput(
            "Expected a JSON array of records".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_array() {
        let records = parse_records(r#"[{"amount": 100, "currency": "USD"}, {"notes": "diesel"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, Some(100.0));
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_parse_single_record() {
        let records = parse_records(r#"{"activity_amount": 12, "activity_type": "waste"}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].activity_type.as_deref(), Some("waste"));
    }

    #[test]
    fn test_parse_records_rejects_scalars() {
        assert!(matches!(parse_records("42"), Err(CliError::InvalidInput(_))));
        assert!(matches!(parse_records("not json"), Err(CliError::Serialization(_))));
    }
}
