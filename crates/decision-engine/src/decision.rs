//! RUL Class Decisions

use crate::classes::{
    class_probs_from_survival, ClassBoundaries, ClassProbabilities, CostMatrix, NUM_BOUNDARIES,
};
use crate::survival::SurvivalOracle;
use crate::DecisionError;
use feature_engine::FeatureMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cost-minimizing decision for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostDecision {
    /// Chosen RUL class
    pub class: usize,
    /// Expected cost of the chosen class
    pub expected_cost: f64,
    pub probabilities: ClassProbabilities,
}

/// Maximum-probability decision for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgmaxDecision {
    /// Chosen RUL class
    pub class: usize,
    /// Probability of the chosen class
    pub probability: f64,
    pub probabilities: ClassProbabilities,
}

/// Survival of every row evaluated at the class boundaries
pub fn survival_at_boundaries<O>(
    oracle: &O,
    features: &FeatureMatrix,
    boundaries: &ClassBoundaries,
) -> Result<Vec<[f64; NUM_BOUNDARIES]>, DecisionError>
where
    O: SurvivalOracle + ?Sized,
{
    let curves = oracle.predict_survival_function(features)?;
    if curves.len() != features.len() {
        return Err(DecisionError::ShapeMismatch {
            expected: features.len(),
            actual: curves.len(),
        });
    }
    Ok(curves.iter().map(|c| c.at_boundaries(boundaries)).collect())
}

/// Class probabilities of every row
pub fn class_probabilities<O>(
    oracle: &O,
    features: &FeatureMatrix,
    boundaries: &ClassBoundaries,
) -> Result<Vec<ClassProbabilities>, DecisionError>
where
    O: SurvivalOracle + ?Sized,
{
    Ok(survival_at_boundaries(oracle, features, boundaries)?
        .iter()
        .map(class_probs_from_survival)
        .collect())
}

/// Choose, per row, the class with minimal expected misclassification cost.
///
/// Exact ties resolve to the lowest class index.
pub fn decide_by_cost<O>(
    oracle: &O,
    features: &FeatureMatrix,
    boundaries: &ClassBoundaries,
    cost: &CostMatrix,
) -> Result<Vec<CostDecision>, DecisionError>
where
    O: SurvivalOracle + ?Sized,
{
    let decisions: Vec<CostDecision> = class_probabilities(oracle, features, boundaries)?
        .into_iter()
        .map(|probabilities| {
            let expected = cost.expected_costs(&probabilities);
            let mut class = 0;
            for (candidate, value) in expected.iter().enumerate().skip(1) {
                if *value < expected[class] {
                    class = candidate;
                }
            }
            CostDecision {
                class,
                expected_cost: expected[class],
                probabilities,
            }
        })
        .collect();

    debug!("Cost decisions for {} rows", decisions.len());
    Ok(decisions)
}

/// Choose, per row, the most probable class.
///
/// Exact ties resolve to the lowest class index.
pub fn decide_by_argmax<O>(
    oracle: &O,
    features: &FeatureMatrix,
    boundaries: &ClassBoundaries,
) -> Result<Vec<ArgmaxDecision>, DecisionError>
where
    O: SurvivalOracle + ?Sized,
{
    let decisions: Vec<ArgmaxDecision> = class_probabilities(oracle, features, boundaries)?
        .into_iter()
        .map(|probabilities| {
            let mut class = 0;
            for (candidate, p) in probabilities.iter().enumerate().skip(1) {
                if *p > probabilities[class] {
                    class = candidate;
                }
            }
            ArgmaxDecision {
                class,
                probability: probabilities[class],
                probabilities,
            }
        })
        .collect();

    debug!("Argmax decisions for {} rows", decisions.len());
    Ok(decisions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::NUM_CLASSES;
    use crate::survival::SurvivalCurve;
    use proptest::prelude::*;

    /// Oracle reading S(τ1..τ4) straight from the first four feature columns
    struct ColumnOracle;

    impl SurvivalOracle for ColumnOracle {
        fn predict_survival_function(
            &self,
            features: &FeatureMatrix,
        ) -> Result<Vec<SurvivalCurve>, DecisionError> {
            let taus = ClassBoundaries::default();
            features
                .rows()
                .iter()
                .map(|row| SurvivalCurve::new(taus.as_array().to_vec(), row[..4].to_vec()))
                .collect()
        }
    }

    struct ShortOracle;

    impl SurvivalOracle for ShortOracle {
        fn predict_survival_function(
            &self,
            _features: &FeatureMatrix,
        ) -> Result<Vec<SurvivalCurve>, DecisionError> {
            Ok(vec![])
        }
    }

    fn matrix(rows: &[[f64; 4]]) -> FeatureMatrix {
        FeatureMatrix::from_rows(
            (1..=4).map(|i| format!("s{i}")).collect(),
            (0..rows.len()).map(|i| format!("w{i}")).collect(),
            rows.iter().map(|r| r.to_vec()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_cost_decision_prefers_urgent_class_under_asymmetric_costs() {
        // 70% healthy, 30% imminent failure
        let x = matrix(&[[0.7, 0.7, 0.7, 0.7]]);
        let taus = ClassBoundaries::default();
        let cost = CostMatrix::default();

        let by_cost = decide_by_cost(&ColumnOracle, &x, &taus, &cost).unwrap();
        let by_argmax = decide_by_argmax(&ColumnOracle, &x, &taus).unwrap();

        assert_eq!(by_argmax[0].class, 0);
        assert!((by_argmax[0].probability - 0.7).abs() < 1e-12);
        // predicting 0 costs 0.3*500 = 150, predicting 4 costs 0.7*10 = 7
        assert_eq!(by_cost[0].class, 4);
        assert!((by_cost[0].expected_cost - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_resolve_to_lowest_class() {
        let x = matrix(&[[0.5, 0.5, 0.5, 0.5]]);
        let taus = ClassBoundaries::default();
        let argmax = decide_by_argmax(&ColumnOracle, &x, &taus).unwrap();
        // p0 = p4 = 0.5
        assert_eq!(argmax[0].class, 0);

        let zero_cost = CostMatrix::new([[0.0; NUM_CLASSES]; NUM_CLASSES]).unwrap();
        let by_cost = decide_by_cost(&ColumnOracle, &x, &taus, &zero_cost).unwrap();
        assert_eq!(by_cost[0].class, 0);
    }

    #[test]
    fn test_oracle_row_count_mismatch() {
        let x = matrix(&[[1.0; 4]]);
        let err = decide_by_argmax(&ShortOracle, &x, &ClassBoundaries::default()).unwrap_err();
        assert!(matches!(
            err,
            DecisionError::ShapeMismatch {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_dyn_oracle() {
        let oracle: Box<dyn SurvivalOracle> = Box::new(ColumnOracle);
        let x = matrix(&[[0.0; 4]]);
        let d = decide_by_argmax(oracle.as_ref(), &x, &ClassBoundaries::default()).unwrap();
        assert_eq!(d[0].class, 4);
    }

    proptest! {
        #[test]
        fn proptest_decisions_in_range_and_cost_consistent(
            rows in proptest::collection::vec(proptest::array::uniform4(0.0f64..=1.0), 1..20)
        ) {
            let x = matrix(&rows);
            let taus = ClassBoundaries::default();
            let cost = CostMatrix::default();

            let by_cost = decide_by_cost(&ColumnOracle, &x, &taus, &cost).unwrap();
            let by_argmax = decide_by_argmax(&ColumnOracle, &x, &taus).unwrap();
            prop_assert_eq!(by_cost.len(), rows.len());

            for (c, a) in by_cost.iter().zip(&by_argmax) {
                prop_assert!(c.class < NUM_CLASSES);
                prop_assert!(a.class < NUM_CLASSES);
                let direct: f64 = (0..NUM_CLASSES)
                    .map(|i| c.probabilities[i] * cost.cost(i, c.class))
                    .sum();
                prop_assert!((direct - c.expected_cost).abs() < 1e-9);
                let best = cost.expected_costs(&c.probabilities);
                prop_assert!(best.iter().all(|v| c.expected_cost <= *v + 1e-12));
            }
        }
    }
}
