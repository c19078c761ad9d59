//! Survival Curves and the Survival Oracle Capability

use crate::classes::{ClassBoundaries, NUM_BOUNDARIES};
use crate::DecisionError;
use feature_engine::FeatureMatrix;
use serde::{Deserialize, Serialize};

/// Capability of a survival model: one survival curve per feature row.
///
/// Implementations are shared read-only across requests, so they must be
/// `Send + Sync`. Any model family fits behind this trait.
pub trait SurvivalOracle: Send + Sync {
    /// Predict the survival function of every row of `features`, in row order
    fn predict_survival_function(
        &self,
        features: &FeatureMatrix,
    ) -> Result<Vec<SurvivalCurve>, DecisionError>;
}

#[derive(Deserialize)]
struct RawCurve {
    times: Vec<f64>,
    survival: Vec<f64>,
}

/// Right-continuous step function S(t).
///
/// `S(t) = 1` before the first event time and keeps the last value after the
/// last one. Values must lie in [0, 1]; monotonicity is not enforced since
/// some model families interpolate curves that wiggle slightly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCurve")]
pub struct SurvivalCurve {
    times: Vec<f64>,
    survival: Vec<f64>,
}

impl SurvivalCurve {
    /// Validate and build a step function from event times and survival values
    pub fn new(times: Vec<f64>, survival: Vec<f64>) -> Result<Self, DecisionError> {
        if times.len() != survival.len() {
            return Err(DecisionError::InvalidCurve(format!(
                "{} event times but {} survival values",
                times.len(),
                survival.len()
            )));
        }
        if times.iter().any(|t| !t.is_finite()) || times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DecisionError::InvalidCurve(
                "event times must be finite and strictly ascending".to_string(),
            ));
        }
        if survival.iter().any(|s| !(0.0..=1.0).contains(s)) {
            return Err(DecisionError::InvalidCurve(
                "survival values must lie in [0, 1]".to_string(),
            ));
        }
        Ok(Self { times, survival })
    }

    /// Curve that never decays
    pub fn constant_one() -> Self {
        Self {
            times: Vec::new(),
            survival: Vec::new(),
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn survival(&self) -> &[f64] {
        &self.survival
    }

    /// Evaluate S(t)
    pub fn at(&self, t: f64) -> f64 {
        let idx = self.times.partition_point(|&x| x <= t);
        if idx == 0 {
            1.0
        } else {
            self.survival[idx - 1]
        }
    }

    /// Evaluate S at each of the class boundaries
    pub fn at_boundaries(&self, boundaries: &ClassBoundaries) -> [f64; NUM_BOUNDARIES] {
        boundaries.as_array().map(|tau| self.at(tau))
    }

    /// Curve raised to a power, `S(t)^exponent`
    pub fn powf(&self, exponent: f64) -> Self {
        Self {
            times: self.times.clone(),
            survival: self.survival.iter().map(|s| s.powf(exponent)).collect(),
        }
    }
}

impl TryFrom<RawCurve> for SurvivalCurve {
    type Error = DecisionError;

    fn try_from(raw: RawCurve) -> Result<Self, Self::Error> {
        Self::new(raw.times, raw.survival)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> SurvivalCurve {
        SurvivalCurve::new(vec![5.0, 10.0, 30.0], vec![0.9, 0.6, 0.2]).unwrap()
    }

    #[test]
    fn test_step_evaluation() {
        let c = curve();
        assert_eq!(c.at(0.0), 1.0);
        assert_eq!(c.at(4.99), 1.0);
        assert_eq!(c.at(5.0), 0.9);
        assert_eq!(c.at(12.0), 0.6);
        assert_eq!(c.at(100.0), 0.2);
    }

    #[test]
    fn test_at_boundaries() {
        let values = curve().at_boundaries(&ClassBoundaries::default());
        assert_eq!(values, [0.9, 0.6, 0.6, 0.2]);
    }

    #[test]
    fn test_rejects_invalid_curves() {
        assert!(SurvivalCurve::new(vec![1.0, 1.0], vec![0.5, 0.4]).is_err());
        assert!(SurvivalCurve::new(vec![1.0], vec![1.2]).is_err());
        assert!(SurvivalCurve::new(vec![1.0, 2.0], vec![0.5]).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: SurvivalCurve =
            serde_json::from_str(r#"{"times": [1.0, 2.0], "survival": [0.8, 0.5]}"#).unwrap();
        assert_eq!(ok.at(1.5), 0.8);
        assert!(serde_json::from_str::<SurvivalCurve>(
            r#"{"times": [2.0, 1.0], "survival": [0.8, 0.5]}"#
        )
        .is_err());
    }

    #[test]
    fn test_powf_and_constant() {
        let squared = curve().powf(2.0);
        assert!((squared.at(5.0) - 0.81).abs() < 1e-12);
        assert_eq!(SurvivalCurve::constant_one().at(1e9), 1.0);
    }
}
