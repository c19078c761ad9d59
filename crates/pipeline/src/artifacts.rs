//! Persisted artifacts consumed at startup
//!
//! - selected features: JSON list of `{"feature": ..., "p_value": ...}`
//! - permutation importance: JSON list of
//!   `{"feature": ..., "importances_mean": ..., "importances_std": ...}`
//! - survival model: see [`decision_engine::ProportionalHazardsModel`]

use crate::config::ArtifactPaths;
use crate::PipelineError;
use decision_engine::ProportionalHazardsModel;
use feature_engine::SelectedFeatures;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Number of importances handed to the explanation context
pub const TOP_IMPORTANCES: usize = 10;

/// Global importance of one feature from permutation testing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationImportance {
    pub feature: String,
    pub importances_mean: f64,
    #[serde(default)]
    pub importances_std: f64,
}

/// Everything loaded from disk before serving requests
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub model: ProportionalHazardsModel,
    pub selected_features: SelectedFeatures,
    /// Sorted by mean importance, descending
    pub importances: Option<Vec<PermutationImportance>>,
}

impl Artifacts {
    pub fn load(paths: &ArtifactPaths) -> Result<Self, PipelineError> {
        require("model", &paths.model)?;
        let model = ProportionalHazardsModel::load(&paths.model)?;
        let selected_features = load_selected_features(&paths.selected_features)?;
        let importances = paths
            .permutation_importance
            .as_deref()
            .map(load_permutation_importance)
            .transpose()?;

        Ok(Self {
            model,
            selected_features,
            importances,
        })
    }
}

pub fn load_selected_features(path: &Path) -> Result<SelectedFeatures, PipelineError> {
    let selected: SelectedFeatures = read_json("selected features", path)?;
    if selected.is_empty() {
        return Err(PipelineError::InvalidArtifact {
            path: path.to_path_buf(),
            reason: "no features selected".to_string(),
        });
    }
    info!(
        "Loaded {} selected features from {}",
        selected.len(),
        path.display()
    );
    Ok(selected)
}

pub fn load_permutation_importance(
    path: &Path,
) -> Result<Vec<PermutationImportance>, PipelineError> {
    let mut importances: Vec<PermutationImportance> = read_json("permutation importance", path)?;
    importances.sort_by(|a, b| b.importances_mean.total_cmp(&a.importances_mean));
    info!(
        "Loaded {} permutation importances from {}",
        importances.len(),
        path.display()
    );
    Ok(importances)
}

fn require(kind: &'static str, path: &Path) -> Result<(), PipelineError> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::MissingArtifact {
            kind,
            path: path.to_path_buf(),
        })
    }
}

fn read_json<T: DeserializeOwned>(kind: &'static str, path: &Path) -> Result<T, PipelineError> {
    require(kind, path)?;
    let invalid = |reason: String| PipelineError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))
}
