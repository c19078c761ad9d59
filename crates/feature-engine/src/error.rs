//! Feature Engineering Error Types

use readout::VehicleId;
use thiserror::Error;

/// Errors during windowing, extraction or selection
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Window duration is not a finite positive number
    #[error("Invalid window size: {0}")]
    InvalidWindowSize(f64),

    /// Long-format reading with a NaN or infinite time step
    #[error("Non-finite time step for vehicle {0}")]
    NonFiniteTimeStep(VehicleId),

    /// A selected feature name is absent from the extracted features
    #[error("Selected feature missing from extracted features: {0}")]
    MissingSelectedFeature(String),

    /// Feature row does not match the matrix columns
    #[error("Feature row width mismatch: expected {expected}, got {actual}")]
    RowWidth { expected: usize, actual: usize },

    /// Extractor constructed with an unusable configuration
    #[error("Invalid extractor configuration: {0}")]
    InvalidExtractor(String),

    /// Worker pool could not be started
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
