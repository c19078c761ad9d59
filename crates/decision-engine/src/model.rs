//! Proportional Hazards Survival Model
//!
//! `S(t | x) = S0(t) ^ exp(β · (x - μ))` over a baseline step function `S0`.
//! Stored as JSON:
//!
//! ```json
//! {
//!   "features": ["pressure__mean", "pressure_diff__max"],
//!   "coefficients": [0.8, -0.2],
//!   "means": [3.1, 0.0],
//!   "baseline": { "times": [6, 12, 24, 48], "survival": [0.95, 0.9, 0.7, 0.4] }
//! }
//! ```

use crate::survival::{SurvivalCurve, SurvivalOracle};
use crate::DecisionError;
use feature_engine::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionalHazardsModel {
    features: Vec<String>,
    coefficients: Vec<f64>,
    /// Centering values, zero when absent
    #[serde(default)]
    means: Vec<f64>,
    baseline: SurvivalCurve,
}

impl ProportionalHazardsModel {
    /// Build a model; `means` may be empty for an uncentered model
    pub fn new(
        features: Vec<String>,
        coefficients: Vec<f64>,
        means: Vec<f64>,
        baseline: SurvivalCurve,
    ) -> Result<Self, DecisionError> {
        let model = Self {
            features,
            coefficients,
            means,
            baseline,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load a serialized model from disk
    pub fn load(path: &Path) -> Result<Self, DecisionError> {
        if !path.exists() {
            return Err(DecisionError::MissingArtifact(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DecisionError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        let model: Self = serde_json::from_str(&raw)
            .map_err(|e| DecisionError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        model.validate()?;

        info!(
            "Loaded proportional hazards model from {} ({} features, {} baseline steps)",
            path.display(),
            model.features.len(),
            model.baseline.times().len()
        );
        Ok(model)
    }

    /// Feature columns the model reads, in coefficient order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    fn validate(&self) -> Result<(), DecisionError> {
        if self.coefficients.len() != self.features.len() {
            return Err(DecisionError::ModelLoad(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                self.features.len()
            )));
        }
        if !self.means.is_empty() && self.means.len() != self.features.len() {
            return Err(DecisionError::ModelLoad(format!(
                "{} means for {} features",
                self.means.len(),
                self.features.len()
            )));
        }
        if self.coefficients.iter().chain(&self.means).any(|v| !v.is_finite()) {
            return Err(DecisionError::ModelLoad(
                "coefficients and means must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn mean(&self, index: usize) -> f64 {
        self.means.get(index).copied().unwrap_or(0.0)
    }
}

impl SurvivalOracle for ProportionalHazardsModel {
    fn predict_survival_function(
        &self,
        features: &FeatureMatrix,
    ) -> Result<Vec<SurvivalCurve>, DecisionError> {
        let positions = self
            .features
            .iter()
            .map(|name| {
                features
                    .column_index(name)
                    .ok_or_else(|| DecisionError::MissingFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let curves: Vec<SurvivalCurve> = features
            .rows()
            .iter()
            .map(|row| {
                let linear: f64 = positions
                    .iter()
                    .enumerate()
                    .map(|(k, &col)| self.coefficients[k] * (row[col] - self.mean(k)))
                    .sum();
                self.baseline.powf(linear.exp())
            })
            .collect();

        debug!("Predicted {} survival curves", curves.len());
        Ok(curves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn baseline() -> SurvivalCurve {
        SurvivalCurve::new(vec![6.0, 12.0, 24.0, 48.0], vec![0.9, 0.8, 0.5, 0.25]).unwrap()
    }

    fn model() -> ProportionalHazardsModel {
        ProportionalHazardsModel::new(
            vec!["load".into()],
            vec![std::f64::consts::LN_2],
            vec![1.0],
            baseline(),
        )
        .unwrap()
    }

    #[test]
    fn test_centered_row_gets_baseline() {
        let x = FeatureMatrix::from_rows(
            vec!["other".into(), "load".into()],
            vec!["w0".into(), "w1".into()],
            vec![vec![9.0, 1.0], vec![9.0, 2.0]],
        )
        .unwrap();
        let curves = model().predict_survival_function(&x).unwrap();

        assert_eq!(curves.len(), 2);
        assert!((curves[0].at(24.0) - 0.5).abs() < 1e-12);
        // one unit above the mean doubles the hazard: S0^2
        assert!((curves[1].at(24.0) - 0.25).abs() < 1e-12);
        assert!((curves[1].at(48.0) - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_missing_feature_column() {
        let x = FeatureMatrix::from_rows(vec!["other".into()], vec!["w0".into()], vec![vec![1.0]])
            .unwrap();
        let err = model().predict_survival_function(&x).unwrap_err();
        assert!(matches!(err, DecisionError::MissingFeature(name) if name == "load"));
    }

    #[test]
    fn test_rejects_inconsistent_lengths() {
        assert!(ProportionalHazardsModel::new(
            vec!["a".into(), "b".into()],
            vec![1.0],
            vec![],
            baseline()
        )
        .is_err());
    }

    #[test]
    fn test_load_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&model()).unwrap().as_bytes())
            .unwrap();

        let loaded = ProportionalHazardsModel::load(file.path()).unwrap();
        assert_eq!(loaded, model());
        assert_eq!(loaded.features(), ["load".to_string()]);
    }

    #[test]
    fn test_load_without_means() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"features": ["load"], "coefficients": [0.0], "baseline": {{"times": [1.0], "survival": [0.5]}}}}"#
        )
        .unwrap();
        let loaded = ProportionalHazardsModel::load(file.path()).unwrap();
        assert_eq!(loaded.mean(0), 0.0);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("model.json");
        assert!(matches!(
            ProportionalHazardsModel::load(&missing),
            Err(DecisionError::MissingArtifact(_))
        ));

        std::fs::write(&missing, "not json").unwrap();
        assert!(matches!(
            ProportionalHazardsModel::load(&missing),
            Err(DecisionError::ModelLoad(_))
        ));
    }
}
