//! Realized Decision Cost Evaluation

use crate::classes::{CostMatrix, NUM_CLASSES};
use crate::DecisionError;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Realized cost of a set of decisions against ground truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizedCost {
    /// Rows = true class, columns = predicted class, labels 0..=4
    pub confusion: [[u64; NUM_CLASSES]; NUM_CLASSES],
    /// Sum of the confusion matrix weighted elementwise by the cost matrix
    pub total: f64,
    /// Total cost per evaluated row
    pub average: f64,
    /// Fraction of exact class matches
    pub accuracy: f64,
}

/// Score predicted classes against true classes.
///
/// Both slices must have the same length, hold labels in 0..=4 and be
/// non-empty.
pub fn evaluate_realized(
    true_class: &[usize],
    pred_class: &[usize],
    cost: &CostMatrix,
) -> Result<RealizedCost, DecisionError> {
    if true_class.len() != pred_class.len() {
        return Err(DecisionError::ShapeMismatch {
            expected: true_class.len(),
            actual: pred_class.len(),
        });
    }
    if true_class.is_empty() {
        return Err(DecisionError::EmptyEvaluation);
    }
    if let Some(&bad) = true_class
        .iter()
        .chain(pred_class)
        .find(|&&c| c >= NUM_CLASSES)
    {
        return Err(DecisionError::InvalidClass(bad));
    }

    let mut confusion = [[0u64; NUM_CLASSES]; NUM_CLASSES];
    for (&t, &p) in true_class.iter().zip(pred_class) {
        confusion[t][p] += 1;
    }

    let mut total = 0.0;
    for (actual, row) in confusion.iter().enumerate() {
        for (predicted, &count) in row.iter().enumerate() {
            total += count as f64 * cost.cost(actual, predicted);
        }
    }

    let n = true_class.len() as f64;
    let matches = true_class
        .iter()
        .zip(pred_class)
        .filter(|(t, p)| t == p)
        .count();

    let report = RealizedCost {
        confusion,
        total,
        average: total / n,
        accuracy: matches as f64 / n,
    };
    info!(
        "Realized cost over {} rows: total={:.1}, average={:.3}, accuracy={:.3}",
        true_class.len(),
        report.total,
        report.average,
        report.accuracy
    );
    Ok(report)
}
