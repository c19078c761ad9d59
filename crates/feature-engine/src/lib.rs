//! Feature Engineering Engine
//!
//! Turns per-vehicle readouts into a feature matrix: trailing fixed-duration
//! windows in long format, per-window channel statistics computed on a worker
//! pool, metadata reattachment and projection onto a selected feature set.

mod error;
mod extractor;
mod matrix;
mod selection;
mod statistics;
mod window;

pub use error::FeatureError;
pub use extractor::{attach_metadata, impute, StatisticalExtractor, WindowFeatureExtractor};
pub use matrix::{FeatureMatrix, WindowMeta};
pub use selection::{select_features, SelectedFeature, SelectedFeatures};
pub use statistics::{Statistic, WindowStatistics};
pub use window::{
    build_windows, build_windows_long, is_fallback_id, melt, window_id, LongReading, Window,
    WindowRow, WindowTable, FALLBACK_SUFFIX,
};
