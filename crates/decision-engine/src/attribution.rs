//! Local Feature Attribution
//!
//! One-feature-at-a-time sensitivity: each feature of a single instance is
//! replaced by its population median and the resulting shift of the class
//! probabilities (sum of absolute per-class differences) is its impact.
//! Feature interactions are not accounted for.

use crate::classes::ClassBoundaries;
use crate::decision::class_probabilities;
use crate::survival::SurvivalOracle;
use crate::DecisionError;
use feature_engine::FeatureMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Impact of one feature on an instance's class probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: String,
    pub impact: f64,
}

/// Rank the population's features by their local impact on `instance`.
///
/// `instance` must be a one-row matrix containing every column of
/// `population`. Features whose population has no finite value cannot be
/// perturbed and get impact 0. The result is sorted by impact, descending.
pub fn local_attribution<O>(
    oracle: &O,
    population: &FeatureMatrix,
    instance: &FeatureMatrix,
    boundaries: &ClassBoundaries,
) -> Result<Vec<FeatureImpact>, DecisionError>
where
    O: SurvivalOracle + ?Sized,
{
    let base = match instance.rows() {
        [row] => row.clone(),
        rows => {
            return Err(DecisionError::ShapeMismatch {
                expected: 1,
                actual: rows.len(),
            })
        }
    };
    let base_id = instance.ids()[0].clone();

    // Row 0 is the untouched instance, then one perturbed copy per feature
    let mut batch = FeatureMatrix::new(instance.columns().to_vec());
    batch.push_row(base_id.clone(), base.clone())?;

    let mut perturbed: Vec<(String, Option<usize>)> =
        Vec::with_capacity(population.columns().len());
    for (pop_idx, name) in population.columns().iter().enumerate() {
        let idx = instance
            .column_index(name)
            .ok_or_else(|| DecisionError::MissingFeature(name.clone()))?;

        let Some(median) = finite_median(&population.column_values(pop_idx)) else {
            debug!("No finite population values for {}, impact fixed at 0", name);
            perturbed.push((name.clone(), None));
            continue;
        };

        let mut row = base.clone();
        row[idx] = median;
        batch.push_row(format!("{base_id}:{name}"), row)?;
        perturbed.push((name.clone(), Some(batch.len() - 1)));
    }

    let probs = class_probabilities(oracle, &batch, boundaries)?;
    let base_probs = probs[0];

    let mut impacts: Vec<FeatureImpact> = perturbed
        .into_iter()
        .map(|(feature, row)| {
            let impact = row.map_or(0.0, |r| {
                base_probs
                    .iter()
                    .zip(&probs[r])
                    .map(|(a, b)| (a - b).abs())
                    .sum()
            });
            FeatureImpact { feature, impact }
        })
        .collect();

    impacts.sort_by(|a, b| b.impact.total_cmp(&a.impact));
    debug!("Local attribution over {} features", impacts.len());
    Ok(impacts)
}

fn finite_median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.total_cmp(b));
    let mid = finite.len() / 2;
    Some(if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survival::SurvivalCurve;

    /// Survival drops with `load`; `noise` has no effect
    struct LoadOracle;

    impl SurvivalOracle for LoadOracle {
        fn predict_survival_function(
            &self,
            features: &FeatureMatrix,
        ) -> Result<Vec<SurvivalCurve>, DecisionError> {
            let load = features
                .column_index("load")
                .ok_or_else(|| DecisionError::MissingFeature("load".into()))?;
            features
                .rows()
                .iter()
                .map(|row| {
                    let s = (1.0 - row[load] / 10.0).clamp(0.0, 1.0);
                    SurvivalCurve::new(vec![1.0], vec![s])
                })
                .collect()
        }
    }

    fn population() -> FeatureMatrix {
        FeatureMatrix::from_rows(
            vec!["noise".into(), "load".into()],
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![5.0, 1.0], vec![-3.0, 2.0], vec![0.0, 3.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_impact_ranks_influential_feature_first() {
        let instance = FeatureMatrix::from_rows(
            vec!["noise".into(), "load".into()],
            vec!["x".into()],
            vec![vec![100.0, 8.0]],
        )
        .unwrap();

        let impacts = local_attribution(
            &LoadOracle,
            &population(),
            &instance,
            &ClassBoundaries::default(),
        )
        .unwrap();

        assert_eq!(impacts.len(), 2);
        assert_eq!(impacts[0].feature, "load");
        // load 8 -> median 2 moves S from 0.2 to 0.8, shifting 0.6 from p4 to p0
        assert!((impacts[0].impact - 1.2).abs() < 1e-9);
        assert_eq!(impacts[1].feature, "noise");
        assert_eq!(impacts[1].impact, 0.0);
    }

    #[test]
    fn test_instance_must_be_single_row() {
        let err = local_attribution(
            &LoadOracle,
            &population(),
            &population(),
            &ClassBoundaries::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DecisionError::ShapeMismatch {
                expected: 1,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_population_column_missing_from_instance() {
        let instance = FeatureMatrix::from_rows(vec!["load".into()], vec!["x".into()], vec![vec![1.0]])
            .unwrap();
        let err = local_attribution(
            &LoadOracle,
            &population(),
            &instance,
            &ClassBoundaries::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DecisionError::MissingFeature(name) if name == "noise"));
    }

    #[test]
    fn test_non_finite_population_column() {
        let population = FeatureMatrix::from_rows(
            vec!["load".into()],
            vec!["a".into()],
            vec![vec![f64::NAN]],
        )
        .unwrap();
        let instance = FeatureMatrix::from_rows(vec!["load".into()], vec!["x".into()], vec![vec![4.0]])
            .unwrap();
        let impacts =
            local_attribution(&LoadOracle, &population, &instance, &ClassBoundaries::default())
                .unwrap();
        assert_eq!(impacts, vec![FeatureImpact { feature: "load".into(), impact: 0.0 }]);
    }
}
