//! Batch calculation and summaries

use crate::resolver::CalculationResolver;
use carbonlens_domain::traits::FactorCatalog;
use carbonlens_domain::ActivityRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::{error, warn};

/// A record that could not be calculated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRecord {
    /// The record, unchanged
    pub record: ActivityRecord,
    /// Why calculation failed
    pub error: String,
}

/// Outcome of a batch, in input order within each list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Records that now carry emissions (including ones that already did)
    pub calculated: Vec<ActivityRecord>,
    /// Records no strategy could handle
    pub failed: Vec<FailedRecord>,
}

impl BatchOutcome {
    /// Total number of records processed
    pub fn len(&self) -> usize {
        self.calculated.len() + self.failed.len()
    }

    /// Whether the batch was empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Aggregate view over calculated records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    /// Records examined
    pub total_records: usize,
    /// Records carrying emissions
    pub calculated_records: usize,
    /// Sum of emissions in kg CO2e
    pub total_emissions_kgco2e: f64,
    /// Records per calculation method
    pub calculation_methods: BTreeMap<String, usize>,
    /// `calculated_records / total_records` (0 for no records)
    pub success_rate: f64,
}

impl<C> CalculationResolver<C>
where
    C: FactorCatalog,
    C::Error: Display,
{
    /// Calculate every record; one failure never affects another
    pub fn calculate_many(&self, records: Vec<ActivityRecord>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for (i, mut record) in records.into_iter().enumerate() {
            match self.calculate_if_missing(&mut record) {
                Ok(_) => outcome.calculated.push(record),
                Err(e) => {
                    error!("Error calculating emissions for record {}: {}", i, e);
                    outcome.failed.push(FailedRecord {
                        record,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !outcome.failed.is_empty() {
            warn!("Failed to calculate emissions for {} records", outcome.failed.len());
        }
        outcome
    }
}

/// Summarize a set of records by calculation method
pub fn summarize(records: &[ActivityRecord]) -> CalculationSummary {
    let mut calculation_methods = BTreeMap::new();
    let mut total_emissions_kgco2e = 0.0;
    let mut calculated_records = 0;

    for record in records {
        if let Some(emissions) = record.emissions_kgco2e {
            calculated_records += 1;
            total_emissions_kgco2e += emissions;
            let method = record.calculation_method.as_deref().unwrap_or("unknown");
            *calculation_methods.entry(method.to_string()).or_insert(0) += 1;
        }
    }

    let success_rate = if records.is_empty() {
        0.0
    } else {
        calculated_records as f64 / records.len() as f64
    };

    CalculationSummary {
        total_records: records.len(),
        calculated_records,
        total_emissions_kgco2e,
        calculation_methods,
        success_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_counts_methods() {
        let mut a = ActivityRecord::spend(100.0, "USD");
        a.emissions_kgco2e = Some(50.0);
        a.calculation_method = Some("spend_based_default_factor".to_string());
        let mut b = ActivityRecord::new();
        b.emissions_kgco2e = Some(12.5);
        let c = ActivityRecord::new();

        let summary = summarize(&[a, b, c]);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.calculated_records, 2);
        assert_eq!(summary.total_emissions_kgco2e, 62.5);
        assert_eq!(summary.calculation_methods["spend_based_default_factor"], 1);
        assert_eq!(summary.calculation_methods["unknown"], 1);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.calculation_methods.is_empty());
    }
}
