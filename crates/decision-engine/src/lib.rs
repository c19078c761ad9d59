//! RUL Decision Engine
//!
//! Converts survival curves from an opaque survival model into probabilities
//! over the five remaining-useful-life classes and into class decisions,
//! either cost-optimal over a misclassification cost matrix or by maximum
//! probability. Also scores realized decisions against ground truth and
//! measures local one-feature-at-a-time sensitivity.

mod attribution;
mod classes;
mod decision;
mod evaluation;
mod model;
mod survival;

pub use attribution::{local_attribution, FeatureImpact};
pub use classes::{
    class_probs_from_survival, ClassBoundaries, ClassProbabilities, CostMatrix, NUM_BOUNDARIES,
    NUM_CLASSES,
};
pub use decision::{
    class_probabilities, decide_by_argmax, decide_by_cost, survival_at_boundaries,
    ArgmaxDecision, CostDecision,
};
pub use evaluation::{evaluate_realized, RealizedCost};
pub use model::ProportionalHazardsModel;
pub use survival::{SurvivalCurve, SurvivalOracle};

use feature_engine::FeatureError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors in survival evaluation and decisioning
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("Model artifact not found: {0}")]
    MissingArtifact(PathBuf),
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("Invalid class label {0}, expected 0..=4")]
    InvalidClass(usize),
    #[error("Cannot evaluate an empty prediction set")]
    EmptyEvaluation,
    #[error("Invalid class boundaries: {0}")]
    InvalidBoundaries(String),
    #[error("Invalid cost matrix: {0}")]
    InvalidCostMatrix(String),
    #[error("Invalid survival curve: {0}")]
    InvalidCurve(String),
    #[error("Feature required by the model is missing: {0}")]
    MissingFeature(String),
    #[error(transparent)]
    Feature(#[from] FeatureError),
}
