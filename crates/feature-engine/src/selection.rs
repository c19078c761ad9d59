//! Feature Selection

use crate::matrix::FeatureMatrix;
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One screened feature and its screening criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedFeature {
    pub feature: String,
    /// p-value from the prior relevance screening
    pub p_value: f64,
}

/// Ordered feature selection (name → criterion)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<SelectedFeature>", into = "Vec<SelectedFeature>")]
pub struct SelectedFeatures {
    entries: Vec<SelectedFeature>,
}

impl SelectedFeatures {
    /// Build a selection; a repeated name keeps its first entry
    pub fn new(entries: Vec<SelectedFeature>) -> Self {
        let mut unique: Vec<SelectedFeature> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !unique.iter().any(|e| e.feature == entry.feature) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    /// Selection from bare names, without a known criterion
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|n| SelectedFeature {
                    feature: n.into(),
                    p_value: f64::NAN,
                })
                .collect(),
        )
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.feature.as_str())
    }

    pub fn entries(&self) -> &[SelectedFeature] {
        &self.entries
    }

    pub fn p_value(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.feature == name)
            .map(|e| e.p_value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<SelectedFeature>> for SelectedFeatures {
    fn from(entries: Vec<SelectedFeature>) -> Self {
        Self::new(entries)
    }
}

impl From<SelectedFeatures> for Vec<SelectedFeature> {
    fn from(selection: SelectedFeatures) -> Self {
        selection.entries
    }
}

/// Project a feature matrix onto exactly the selected features.
///
/// Columns follow the selection order; rows, ids and metadata are untouched.
/// Fails with [`FeatureError::MissingSelectedFeature`] when a selected name
/// was not extracted.
pub fn select_features(
    features: &FeatureMatrix,
    selection: &SelectedFeatures,
) -> Result<FeatureMatrix, FeatureError> {
    let selected = features.select_columns(selection.names())?;
    debug!(
        "Selected {} of {} features",
        selected.columns().len(),
        features.columns().len()
    );
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_keeps_selection_order() {
        let features = FeatureMatrix::from_rows(
            vec!["a__mean".into(), "b__maximum".into(), "c__median".into()],
            vec!["w1".into()],
            vec![vec![1.0, 2.0, 3.0]],
        )
        .unwrap();
        let selection = SelectedFeatures::from_names(["c__median", "a__mean"]);

        let selected = select_features(&features, &selection).unwrap();
        assert_eq!(selected.columns(), &["c__median".to_string(), "a__mean".to_string()]);
        assert_eq!(selected.rows(), &[vec![3.0, 1.0]]);
    }

    #[test]
    fn test_missing_selected_feature() {
        let features = FeatureMatrix::new(vec!["a__mean".into()]);
        let selection = SelectedFeatures::from_names(["a__mean", "b__mean"]);
        assert!(matches!(
            select_features(&features, &selection),
            Err(FeatureError::MissingSelectedFeature(name)) if name == "b__mean"
        ));
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let selection = SelectedFeatures::new(vec![
            SelectedFeature { feature: "x".into(), p_value: 0.01 },
            SelectedFeature { feature: "x".into(), p_value: 0.5 },
        ]);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.p_value("x"), Some(0.01));
    }
}
