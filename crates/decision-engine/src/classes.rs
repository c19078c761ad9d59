//! RUL Classes, Boundaries and Costs

use crate::DecisionError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of ordinal RUL classes (0 = longest remaining life, 4 = most urgent)
pub const NUM_CLASSES: usize = 5;
/// Number of class boundaries
pub const NUM_BOUNDARIES: usize = NUM_CLASSES - 1;

/// Probabilities of classes 0..=4
pub type ClassProbabilities = [f64; NUM_CLASSES];

/// Ascending positive thresholds τ1 < τ2 < τ3 < τ4 partitioning RUL into classes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ClassBoundaries([f64; NUM_BOUNDARIES]);

impl ClassBoundaries {
    /// Validate and wrap class boundaries
    pub fn new(taus: [f64; NUM_BOUNDARIES]) -> Result<Self, DecisionError> {
        if taus.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(DecisionError::InvalidBoundaries(format!(
                "boundaries must be finite and positive, got {taus:?}"
            )));
        }
        if taus.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DecisionError::InvalidBoundaries(format!(
                "boundaries must be strictly ascending, got {taus:?}"
            )));
        }
        Ok(Self(taus))
    }

    pub fn as_array(&self) -> &[f64; NUM_BOUNDARIES] {
        &self.0
    }
}

impl Default for ClassBoundaries {
    fn default() -> Self {
        Self([6.0, 12.0, 24.0, 48.0])
    }
}

impl TryFrom<Vec<f64>> for ClassBoundaries {
    type Error = DecisionError;

    fn try_from(taus: Vec<f64>) -> Result<Self, Self::Error> {
        let taus: [f64; NUM_BOUNDARIES] = taus.try_into().map_err(|v: Vec<f64>| {
            DecisionError::InvalidBoundaries(format!(
                "expected {NUM_BOUNDARIES} boundaries, got {}",
                v.len()
            ))
        })?;
        Self::new(taus)
    }
}

impl From<ClassBoundaries> for Vec<f64> {
    fn from(boundaries: ClassBoundaries) -> Self {
        boundaries.0.to_vec()
    }
}

/// Misclassification costs, `cost[actual][predicted]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct CostMatrix([[f64; NUM_CLASSES]; NUM_CLASSES]);

impl CostMatrix {
    /// Validate and wrap a cost matrix: finite, non-negative, zero diagonal
    pub fn new(matrix: [[f64; NUM_CLASSES]; NUM_CLASSES]) -> Result<Self, DecisionError> {
        for (actual, row) in matrix.iter().enumerate() {
            for (predicted, &c) in row.iter().enumerate() {
                if !c.is_finite() || c < 0.0 {
                    return Err(DecisionError::InvalidCostMatrix(format!(
                        "cost[{actual}][{predicted}] = {c} must be finite and non-negative"
                    )));
                }
                if actual == predicted && c != 0.0 {
                    return Err(DecisionError::InvalidCostMatrix(format!(
                        "diagonal cost[{actual}][{actual}] = {c} must be zero"
                    )));
                }
            }
        }
        Ok(Self(matrix))
    }

    /// Cost of predicting `predicted` when the truth is `actual`
    pub fn cost(&self, actual: usize, predicted: usize) -> f64 {
        self.0[actual][predicted]
    }

    pub fn as_array(&self) -> &[[f64; NUM_CLASSES]; NUM_CLASSES] {
        &self.0
    }

    /// Expected cost of each candidate prediction: `probs · cost[:, predicted]`
    pub fn expected_costs(&self, probs: &ClassProbabilities) -> [f64; NUM_CLASSES] {
        let mut out = [0.0; NUM_CLASSES];
        for (predicted, slot) in out.iter_mut().enumerate() {
            *slot = probs
                .iter()
                .enumerate()
                .map(|(actual, p)| p * self.0[actual][predicted])
                .sum();
        }
        out
    }
}

impl Default for CostMatrix {
    /// Late detection of an urgent class costs far more than early maintenance
    fn default() -> Self {
        Self([
            [0.0, 7.0, 8.0, 9.0, 10.0],
            [200.0, 0.0, 7.0, 8.0, 9.0],
            [300.0, 200.0, 0.0, 7.0, 8.0],
            [400.0, 300.0, 200.0, 0.0, 7.0],
            [500.0, 400.0, 300.0, 200.0, 0.0],
        ])
    }
}

impl TryFrom<Vec<Vec<f64>>> for CostMatrix {
    type Error = DecisionError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        if rows.len() != NUM_CLASSES || rows.iter().any(|r| r.len() != NUM_CLASSES) {
            return Err(DecisionError::InvalidCostMatrix(format!(
                "expected a {NUM_CLASSES}x{NUM_CLASSES} matrix"
            )));
        }
        let mut matrix = [[0.0; NUM_CLASSES]; NUM_CLASSES];
        for (dst, src) in matrix.iter_mut().zip(&rows) {
            dst.copy_from_slice(src);
        }
        Self::new(matrix)
    }
}

impl From<CostMatrix> for Vec<Vec<f64>> {
    fn from(cost: CostMatrix) -> Self {
        cost.0.iter().map(|r| r.to_vec()).collect()
    }
}

/// Class probabilities from survival at the class boundaries.
///
/// With `s = [S(τ1), S(τ2), S(τ3), S(τ4)]`: `p4 = 1 - S(τ1)`,
/// `p3 = S(τ1) - S(τ2)`, `p2 = S(τ2) - S(τ3)`, `p1 = S(τ3) - S(τ4)`,
/// `p0 = S(τ4)`. Components are clamped to [0, 1] and renormalized; a
/// vector without positive mass falls back to `[1, 0, 0, 0, 0]`.
pub fn class_probs_from_survival(s: &[f64; NUM_BOUNDARIES]) -> ClassProbabilities {
    let raw = [
        s[3],
        s[2] - s[3],
        s[1] - s[2],
        s[0] - s[1],
        1.0 - s[0],
    ];

    let clamped = raw.map(|p| p.clamp(0.0, 1.0));
    let total: f64 = clamped.iter().sum();

    // Also catches NaN survival values, whose sum is NaN
    if total > 0.0 {
        clamped.map(|p| p / total)
    } else {
        debug!("Degenerate class probabilities from survival {:?}", s);
        metrics::counter!("rul_degenerate_probabilities_total").increment(1);
        [1.0, 0.0, 0.0, 0.0, 0.0]
    }
}
