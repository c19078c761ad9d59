//! Explanation context
//!
//! Structured facts about one decision, handed to an external text
//! generator. Nothing here produces prose.

use crate::artifacts::{PermutationImportance, TOP_IMPORTANCES};
use crate::PipelineError;
use decision_engine::{ClassBoundaries, CostDecision, CostMatrix, DecisionError, FeatureImpact};
use feature_engine::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rule that produced the explained decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    Cost,
    Argmax,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationContext {
    pub window_id: String,
    /// Selected feature values of the explained row
    pub input_features: BTreeMap<String, f64>,
    pub predicted_class: usize,
    pub method: DecisionMethod,
    pub expected_cost: f64,
    /// `p0`..`p4`
    pub probabilities: BTreeMap<String, f64>,
    pub taus: ClassBoundaries,
    pub cost: CostMatrix,
    /// Most important features globally, at most ten
    pub top_importances: Vec<PermutationImportance>,
    /// Local sensitivity of this row, strongest first
    pub local_attribution: Vec<FeatureImpact>,
}

impl ExplanationContext {
    /// Context for the first row of `features` and its cost decision
    pub fn for_first_row(
        features: &FeatureMatrix,
        decision: &CostDecision,
        taus: ClassBoundaries,
        cost: CostMatrix,
        importances: Option<&[PermutationImportance]>,
        local_attribution: Vec<FeatureImpact>,
    ) -> Result<Self, PipelineError> {
        let (Some(window_id), Some(row)) = (features.ids().first(), features.row(0)) else {
            return Err(DecisionError::ShapeMismatch {
                expected: 1,
                actual: 0,
            }
            .into());
        };

        let input_features = features
            .columns()
            .iter()
            .cloned()
            .zip(row.iter().copied())
            .collect();
        let probabilities = decision
            .probabilities
            .iter()
            .enumerate()
            .map(|(class, p)| (format!("p{class}"), *p))
            .collect();
        let top_importances = importances
            .map(|all| all.iter().take(TOP_IMPORTANCES).cloned().collect())
            .unwrap_or_default();

        Ok(Self {
            window_id: window_id.clone(),
            input_features,
            predicted_class: decision.class,
            method: DecisionMethod::Cost,
            expected_cost: decision.expected_cost,
            probabilities,
            taus,
            cost,
            top_importances,
            local_attribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureMatrix {
        FeatureMatrix::from_rows(
            vec!["a__mean".into(), "b__max".into()],
            vec!["vid1_t3_w8".into()],
            vec![vec![1.5, -2.0]],
        )
        .unwrap()
    }

    fn decision() -> CostDecision {
        CostDecision {
            class: 3,
            expected_cost: 12.5,
            probabilities: [0.1, 0.1, 0.2, 0.4, 0.2],
        }
    }

    #[test]
    fn test_context_fields() {
        let importances: Vec<PermutationImportance> = (0..12)
            .map(|i| PermutationImportance {
                feature: format!("f{i}"),
                importances_mean: 1.0 / (i as f64 + 1.0),
                importances_std: 0.0,
            })
            .collect();

        let ctx = ExplanationContext::for_first_row(
            &features(),
            &decision(),
            ClassBoundaries::default(),
            CostMatrix::default(),
            Some(&importances),
            vec![],
        )
        .unwrap();

        assert_eq!(ctx.window_id, "vid1_t3_w8");
        assert_eq!(ctx.input_features["b__max"], -2.0);
        assert_eq!(ctx.predicted_class, 3);
        assert_eq!(ctx.probabilities["p3"], 0.4);
        assert_eq!(ctx.top_importances.len(), TOP_IMPORTANCES);
        assert_eq!(ctx.top_importances[0].feature, "f0");

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["method"], "cost");
        assert_eq!(json["taus"], serde_json::json!([6.0, 12.0, 24.0, 48.0]));
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        let empty = FeatureMatrix::new(vec!["a__mean".into()]);
        assert!(ExplanationContext::for_first_row(
            &empty,
            &decision(),
            ClassBoundaries::default(),
            CostMatrix::default(),
            None,
            vec![],
        )
        .is_err());
    }
}
