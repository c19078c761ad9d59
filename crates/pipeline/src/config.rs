//! Pipeline configuration
//!
//! Loaded once from a TOML file, overridable through `RUL__SECTION__KEY`
//! environment variables, and immutable afterwards.

use crate::PipelineError;
use decision_engine::{ClassBoundaries, CostMatrix};
use feature_engine::Statistic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "RUL";

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub decision: DecisionConfig,
    pub windowing: WindowingConfig,
    pub extraction: ExtractionConfig,
    pub input: InputConfig,
    pub artifacts: ArtifactPaths,
}

/// Class boundaries and misclassification costs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub taus: ClassBoundaries,
    pub cost: CostMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowingConfig {
    /// Trailing window durations, in time-step units
    pub window_sizes: Vec<f64>,
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            window_sizes: vec![8.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Worker threads for statistic extraction
    pub workers: usize,
    pub statistics: Vec<Statistic>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            statistics: Statistic::DEFAULT.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Reject requests that are not exactly one readout row
    pub single_readout: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            single_readout: true,
        }
    }
}

/// Artifact locations, relative to the configuration file's directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub selected_features: PathBuf,
    pub permutation_importance: Option<PathBuf>,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            model: PathBuf::from("model.json"),
            selected_features: PathBuf::from("selected_features.json"),
            permutation_importance: None,
        }
    }
}

impl ArtifactPaths {
    fn resolve_against(&mut self, base: &Path) {
        self.model = base.join(&self.model);
        self.selected_features = base.join(&self.selected_features);
        if let Some(path) = self.permutation_importance.take() {
            self.permutation_importance = Some(base.join(path));
        }
    }
}

impl PipelineConfig {
    /// Load a TOML file with environment overrides and resolve artifact paths
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: PipelineConfig = settings.try_deserialize()?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        cfg.artifacts.resolve_against(base);
        cfg.validate()?;

        info!(
            "Loaded configuration from {}: window sizes {:?}, {} workers",
            path.display(),
            cfg.windowing.window_sizes,
            cfg.extraction.workers
        );
        Ok(cfg)
    }

    /// Check settings the typed fields cannot express
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.windowing.window_sizes.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "windowing.window_sizes must not be empty".to_string(),
            ));
        }
        if let Some(w) = self
            .windowing
            .window_sizes
            .iter()
            .find(|w| !(w.is_finite() && **w > 0.0))
        {
            return Err(PipelineError::InvalidConfig(format!(
                "window size {w} must be finite and positive"
            )));
        }
        if self.extraction.workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "extraction.workers must be at least 1".to_string(),
            ));
        }
        if self.extraction.statistics.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "extraction.statistics must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
