//! RUL Decision Pipeline
//!
//! Wires readout validation, preprocessing, windowed feature extraction and
//! survival-based decisioning into one immutable [`DecisionService`], loaded
//! from configuration and artifacts at startup.

pub mod artifacts;
pub mod config;
mod explanation;
mod labels;
mod service;

pub use crate::artifacts::{Artifacts, PermutationImportance};
pub use crate::config::PipelineConfig;
pub use explanation::{DecisionMethod, ExplanationContext};
pub use labels::{read_labels, read_labels_from};
pub use service::{DecisionReport, DecisionService, RequestMode, RowDecision};

use decision_engine::DecisionError;
use feature_engine::FeatureError;
use readout::{ReadoutError, VehicleId};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Missing {kind} artifact: {}", path.display())]
    MissingArtifact { kind: &'static str, path: PathBuf },
    #[error("Invalid artifact {}: {reason}", path.display())]
    InvalidArtifact { path: PathBuf, reason: String },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Labelled vehicle {0} has no readouts to decide on")]
    UndecidedVehicle(VehicleId),
    #[error("Duplicate label for vehicle {0}")]
    DuplicateLabel(VehicleId),
    #[error("Logging setup failed: {0}")]
    Logging(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Readout(#[from] ReadoutError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Decision(#[from] DecisionError),
}

/// Initialize logging on stderr, filtered by `RUST_LOG` (default `info`)
pub fn init_logging(json: bool) -> Result<(), PipelineError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| PipelineError::Logging(e.to_string()))
}
