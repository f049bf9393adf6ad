//! Confidence score module

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification confidence, always within [0.0, 1.0]
///
/// Construction clamps instead of rejecting, so a reported `1.2` becomes
/// `1.0`. NaN maps to 0.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct ConfidenceScore(f64);

impl ConfidenceScore {
    /// Score assigned to deterministic pattern matching
    pub const PATTERN_MATCH: ConfidenceScore = ConfidenceScore(0.3);

    /// Score used when a payload does not report one
    pub const UNREPORTED: ConfidenceScore = ConfidenceScore(0.5);

    /// Zero confidence, used for failed attempts
    pub const ZERO: ConfidenceScore = ConfidenceScore(0.0);

    /// Create a new score, clamping into [0, 1]
    ///
    /// # Examples
    ///
    /// ```
    /// use carbonlens_domain::ConfidenceScore;
    ///
    /// assert_eq!(ConfidenceScore::new(1.7).value(), 1.0);
    /// assert_eq!(ConfidenceScore::new(-3.0).value(), 0.0);
    /// assert_eq!(ConfidenceScore::new(0.42).value(), 0.42);
    /// ```
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether this score falls strictly below the review threshold
    pub fn below(&self, threshold: f64) -> bool {
        self.0 < threshold
    }
}

impl Default for ConfidenceScore {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for ConfidenceScore {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<ConfidenceScore> for f64 {
    fn from(score: ConfidenceScore) -> Self {
        score.0
    }
}

impl fmt::Display for ConfidenceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_is_zero() {
        assert_eq!(ConfidenceScore::new(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_infinities_clamp() {
        assert_eq!(ConfidenceScore::new(f64::INFINITY).value(), 1.0);
        assert_eq!(ConfidenceScore::new(f64::NEG_INFINITY).value(), 0.0);
    }

    #[test]
    fn test_below_is_strict() {
        let score = ConfidenceScore::new(0.7);
        assert!(!score.below(0.7));
        assert!(score.below(0.71));
    }

    #[test]
    fn test_deserialize_clamps() {
        let score: ConfidenceScore = serde_json::from_str("4.5").unwrap();
        assert_eq!(score.value(), 1.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: any input lands inside [0, 1]
        #[test]
        fn test_score_always_in_unit_interval(value in proptest::num::f64::ANY) {
            let score = ConfidenceScore::new(value);
            prop_assert!(score.value() >= 0.0 && score.value() <= 1.0);
        }

        /// Property: in-range values are preserved exactly
        #[test]
        fn test_in_range_values_unchanged(value in 0.0f64..=1.0) {
            prop_assert_eq!(ConfidenceScore::new(value).value(), value);
        }
    }
}
