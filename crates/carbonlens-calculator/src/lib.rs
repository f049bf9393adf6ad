//! carbonlens Calculator
//!
//! Turns activity records into auditable emissions figures and puts
//! uncertainty bands around them.
//!
//! # Strategies
//!
//! 1. **Spend-based**: amount × currency factor
//! 2. **Activity-based**: activity quantity × activity, fuel or grid factor
//! 3. **Text extraction**: classify the record's free text, then retry 1-2 on
//!    a fresh record built from the extracted fields only
//!
//! A record that already carries emissions is never recalculated. A record
//! no strategy can handle fails with `CalculationError::InsufficientData`;
//! it is never given a default figure.
//!
//! # Uncertainty
//!
//! `UncertaintyQuantifier` runs a seeded Monte Carlo simulation over the
//! factor's declared uncertainty and reports percentile bounds.

#![warn(missing_docs)]

pub mod batch;
pub mod error;
pub mod resolver;
pub mod strategy;
pub mod uncertainty;


pub use batch::{summarize, BatchOutcome, CalculationSummary, FailedRecord};
pub use error::{CalculationError, UncertaintyError};
pub use resolver::{Calculation, CalculationResolver, DynClassifier, DynEnricher};
pub use strategy::StrategyOutcome;
pub use uncertainty::{quantify, UncertaintyConfig, UncertaintyQuantifier};
