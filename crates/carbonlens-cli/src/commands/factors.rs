//! Factors command implementation.

use super::open_catalog;
use crate::cli::{FactorsAction, FactorsArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use carbonlens_domain::EmissionFactor;
use std::fs;

/// Execute the factors command.
pub fn execute_factors(args: FactorsArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut catalog = open_catalog(config)?;

    match args.action {
        FactorsAction::List => {
            println!("{}", formatter.format_factors(&catalog.all()?)?);
        }
        FactorsAction::Import { file } => {
            let factors: Vec<EmissionFactor> = serde_json::from_str(&fs::read_to_string(&file)?)?;
            let count = catalog.insert_many(&factors)?;
            println!("{}", formatter.success(&format!("Imported {} factor(s)", count)));
        }
    }

    Ok(())
}
