//! Uncertainty command implementation.

use super::open_catalog;
use crate::cli::UncertaintyArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use carbonlens_calculator::UncertaintyQuantifier;
use carbonlens_domain::UncertaintyEstimate;
use carbonlens_factors::FactorResolver;

/// Execute the uncertainty command.
pub fn execute_uncertainty(args: UncertaintyArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let estimate = estimate(&args, config)?;
    println!("{}", formatter.format_uncertainty(&estimate)?);
    Ok(())
}

fn estimate(args: &UncertaintyArgs, config: &Config) -> Result<UncertaintyEstimate> {
    let quantifier = UncertaintyQuantifier::new(config.uncertainty.clone());

    match (&args.fuel, args.factor, args.uncertainty) {
        (Some(fuel), _, _) => {
            let factors = FactorResolver::new(open_catalog(config)?, config.resolver.clone());
            Ok(quantifier.quantify_fuel(&factors, args.amount, fuel, args.region.as_deref(), args.confidence)?)
        }
        (None, Some(factor), Some(pct)) => Ok(quantifier.quantify(args.amount, factor, pct, args.confidence)?),
        _ => Err(CliError::InvalidInput(
            "Provide --fuel, or both --factor and --uncertainty".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(fuel: Option<&str>, factor: Option<f64>, uncertainty: Option<f64>) -> UncertaintyArgs {
        UncertaintyArgs {
            amount: 1000.0,
            fuel: fuel.map(str::to_string),
            region: None,
            factor,
            uncertainty,
            confidence: 0.95,
        }
    }

    #[test]
    fn test_explicit_factor() {
        let estimate = estimate(&args(None, Some(3.0), Some(10.0)), &Config::default()).unwrap();
        assert_eq!(estimate.base_emissions, 3000.0);
        assert!(estimate.contains(3000.0));
    }

    #[test]
    fn test_fuel_uses_table_factor() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            catalog_path: Some(dir.path().join("factors.db")),
            ..Config::default()
        };

        let estimate = estimate(&args(Some("HFO"), None, None), &config).unwrap();
        assert!((estimate.base_emissions - 3114.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_confidence() {
        let mut bad = args(None, Some(3.0), Some(10.0));
        bad.confidence = 1.5;
        assert!(matches!(estimate(&bad, &Config::default()), Err(CliError::Uncertainty(_))));
    }
}
