//! Uncertainty estimate module

use serde::{Deserialize, Serialize};

/// Confidence interval around an emissions point estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyEstimate {
    /// Unperturbed estimate (amount × factor)
    pub base_emissions: f64,
    /// Lower percentile bound
    pub lower_bound: f64,
    /// Upper percentile bound
    pub upper_bound: f64,
    /// Target confidence level in (0, 1)
    pub confidence_level: f64,
    /// Number of simulated samples
    pub iterations: usize,
    /// Declared factor uncertainty in percent
    pub uncertainty_pct: f64,
}

impl UncertaintyEstimate {
    /// Width of the interval
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    /// Whether the interval contains a value
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_bound && value <= self.upper_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_and_contains() {
        let estimate = UncertaintyEstimate {
            base_emissions: 3000.0,
            lower_bound: 2400.0,
            upper_bound: 3600.0,
            confidence_level: 0.95,
            iterations: 1000,
            uncertainty_pct: 10.0,
        };
        assert_eq!(estimate.width(), 1200.0);
        assert!(estimate.contains(3000.0));
        assert!(!estimate.contains(3600.5));
    }
}
