//! Monte Carlo uncertainty quantification
//!
//! Each sample perturbs the factor by a normal relative error with standard
//! deviation `uncertainty_pct / 100`, then multiplies by the activity amount.
//! The interval is read off the sorted samples at `(1 - cl) / 2` and
//! `(1 + cl) / 2` with linear interpolation between neighbouring ranks.
//!
//! Sampling is seeded, so identical inputs always give identical bounds.

use crate::error::UncertaintyError;
use carbonlens_domain::traits::FactorCatalog;
use carbonlens_domain::UncertaintyEstimate;
use carbonlens_factors::FactorResolver;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt::Display;
use tracing::debug;

/// Sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyConfig {
    /// Number of samples drawn
    pub iterations: usize,
    /// RNG seed
    pub seed: u64,
}

impl UncertaintyConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.iterations == 0 {
            return Err("iterations must be at least 1".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: 42,
        }
    }
}

/// Seeded Monte Carlo quantifier
#[derive(Debug, Clone, Default)]
pub struct UncertaintyQuantifier {
    config: UncertaintyConfig,
}

impl UncertaintyQuantifier {
    /// Create a quantifier
    pub fn new(config: UncertaintyConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &UncertaintyConfig {
        &self.config
    }

    /// Interval for `activity_amount × factor` given the factor's uncertainty
    ///
    /// # Examples
    ///
    /// ```
    /// use carbonlens_calculator::UncertaintyQuantifier;
    ///
    /// let estimate = UncertaintyQuantifier::default()
    ///     .quantify(1000.0, 3.0, 10.0, 0.95)
    ///     .unwrap();
    /// assert_eq!(estimate.base_emissions, 3000.0);
    /// assert!(estimate.lower_bound < 3000.0 && estimate.upper_bound > 3000.0);
    /// ```
    pub fn quantify(
        &self,
        activity_amount: f64,
        factor: f64,
        uncertainty_pct: f64,
        confidence_level: f64,
    ) -> Result<UncertaintyEstimate, UncertaintyError> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(UncertaintyError::InvalidConfidenceLevel(confidence_level));
        }
        if !activity_amount.is_finite() {
            return Err(UncertaintyError::InvalidInput(format!(
                "activity amount must be finite, got {}",
                activity_amount
            )));
        }
        if !factor.is_finite() {
            return Err(UncertaintyError::InvalidInput(format!(
                "factor must be finite, got {}",
                factor
            )));
        }
        if !uncertainty_pct.is_finite() || uncertainty_pct < 0.0 {
            return Err(UncertaintyError::InvalidInput(format!(
                "uncertainty_pct must be a non-negative number, got {}",
                uncertainty_pct
            )));
        }
        self.config.validate().map_err(UncertaintyError::InvalidInput)?;

        let sigma = uncertainty_pct / 100.0;
        let mut rng = ChaCha20Rng::seed_from_u64(self.config.seed);
        let mut samples: Vec<f64> = (0..self.config.iterations)
            .map(|_| activity_amount * factor * (1.0 + sigma * standard_normal(&mut rng)))
            .collect();
        samples.sort_by(f64::total_cmp);

        let lower_bound = percentile(&samples, (1.0 - confidence_level) / 2.0);
        let upper_bound = percentile(&samples, (1.0 + confidence_level) / 2.0);

        debug!(
            "quantified {} samples: [{:.3}, {:.3}] at {}",
            samples.len(),
            lower_bound,
            upper_bound,
            confidence_level
        );

        Ok(UncertaintyEstimate {
            base_emissions: activity_amount * factor,
            lower_bound,
            upper_bound,
            confidence_level,
            iterations: self.config.iterations,
            uncertainty_pct,
        })
    }

    /// Interval for burning `activity_amount` of a fuel in a region
    pub fn quantify_fuel<C>(
        &self,
        factors: &FactorResolver<C>,
        activity_amount: f64,
        fuel: &str,
        region: Option<&str>,
        confidence_level: f64,
    ) -> Result<UncertaintyEstimate, UncertaintyError>
    where
        C: FactorCatalog,
        C::Error: Display,
    {
        let factor = factors.fuel_factor(fuel, region)?;
        self.quantify(activity_amount, factor.value, factor.uncertainty_pct, confidence_level)
    }
}

/// Quantify with the default sampling parameters (1000 samples, seed 42)
pub fn quantify(
    activity_amount: f64,
    factor: f64,
    uncertainty_pct: f64,
    confidence_level: f64,
) -> Result<UncertaintyEstimate, UncertaintyError> {
    UncertaintyQuantifier::default().quantify(activity_amount, factor, uncertainty_pct, confidence_level)
}

/// Box-Muller transform
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // u1 in (0, 1] keeps ln finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Linear-interpolated percentile of sorted samples; `q` in [0, 1]
fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = q * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_inputs_identical_bounds() {
        let a = quantify(1000.0, 3.0, 10.0, 0.95).unwrap();
        let b = quantify(1000.0, 3.0, 10.0, 0.95).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.iterations, 1000);
    }

    #[test]
    fn test_bounds_are_plausible() {
        let estimate = quantify(1000.0, 3.0, 10.0, 0.95).unwrap();

        // ±1.96σ of 3000 with σ = 300
        assert!(estimate.lower_bound > 2300.0 && estimate.lower_bound < 2550.0);
        assert!(estimate.upper_bound > 3450.0 && estimate.upper_bound < 3700.0);
        assert!(estimate.contains(estimate.base_emissions));
    }

    #[test]
    fn test_wider_level_gives_wider_interval() {
        let narrow = quantify(1000.0, 3.0, 10.0, 0.5).unwrap();
        let wide = quantify(1000.0, 3.0, 10.0, 0.99).unwrap();
        assert!(wide.width() > narrow.width());
    }

    #[test]
    fn test_zero_uncertainty_collapses_interval() {
        let estimate = quantify(250.0, 2.0, 0.0, 0.95).unwrap();
        assert_eq!(estimate.lower_bound, 500.0);
        assert_eq!(estimate.upper_bound, 500.0);
    }

    #[test]
    fn test_seed_changes_samples() {
        let other = UncertaintyQuantifier::new(UncertaintyConfig { iterations: 1000, seed: 7 });
        let a = quantify(1000.0, 3.0, 10.0, 0.95).unwrap();
        let b = other.quantify(1000.0, 3.0, 10.0, 0.95).unwrap();
        assert_ne!(a.lower_bound, b.lower_bound);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            quantify(1.0, 1.0, 5.0, 1.0),
            Err(UncertaintyError::InvalidConfidenceLevel(1.0))
        );
        assert!(matches!(
            quantify(1.0, 1.0, 5.0, 0.0),
            Err(UncertaintyError::InvalidConfidenceLevel(_))
        ));
        assert!(matches!(
            quantify(f64::NAN, 1.0, 5.0, 0.9),
            Err(UncertaintyError::InvalidInput(_))
        ));
        assert!(matches!(
            quantify(1.0, 1.0, -5.0, 0.9),
            Err(UncertaintyError::InvalidInput(_))
        ));
        assert!(matches!(
            quantify(1.0, f64::INFINITY, 5.0, 0.9),
            Err(UncertaintyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 0.5), 3.0);
        assert_eq!(percentile(&sorted, 0.125), 1.5);
        assert_eq!(percentile(&sorted, 1.0), 5.0);
    }

    #[test]
    fn test_quantify_fuel_uses_fuel_table() {
        let factors = FactorResolver::with_defaults();
        let estimate = UncertaintyQuantifier::default()
            .quantify_fuel(&factors, 1000.0, "HFO", None, 0.95)
            .unwrap();

        assert!((estimate.base_emissions - 3114.0).abs() < 1e-9);
        assert_eq!(estimate.uncertainty_pct, 2.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(UncertaintyConfig::default().validate().is_ok());
        let config = UncertaintyConfig { iterations: 0, seed: 1 };
        assert!(config.validate().is_err());

        let quantifier = UncertaintyQuantifier::new(config);
        assert!(quantifier.quantify(1.0, 1.0, 1.0, 0.5).is_err());
    }
}
