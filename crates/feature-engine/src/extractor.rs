//! Window Feature Extraction

use crate::matrix::{FeatureMatrix, WindowMeta};
use crate::statistics::{median_in_place, Statistic, WindowStatistics};
use crate::window::{Window, WindowTable};
use crate::FeatureError;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Feature extraction boundary: one feature row per window id
pub trait WindowFeatureExtractor: Send + Sync {
    /// Compute features for every window, rows in window first-appearance order
    fn extract(&self, windows: &WindowTable) -> Result<FeatureMatrix, FeatureError>;
}

/// Statistic extractor running windows in parallel on a dedicated worker pool
#[derive(Debug, Clone)]
pub struct StatisticalExtractor {
    statistics: Vec<Statistic>,
    workers: usize,
}

impl StatisticalExtractor {
    /// Create an extractor for the given statistic set and worker count
    pub fn new(statistics: Vec<Statistic>, workers: usize) -> Result<Self, FeatureError> {
        if statistics.is_empty() {
            return Err(FeatureError::InvalidExtractor(
                "statistic set is empty".to_string(),
            ));
        }
        if workers == 0 {
            return Err(FeatureError::InvalidExtractor(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            statistics,
            workers,
        })
    }

    /// Extractor computing [`Statistic::DEFAULT`]
    pub fn with_default_statistics(workers: usize) -> Result<Self, FeatureError> {
        Self::new(Statistic::DEFAULT.to_vec(), workers)
    }

    pub fn statistics(&self) -> &[Statistic] {
        &self.statistics
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn window_features(&self, window: &Window<'_>, kinds: &[String]) -> Vec<f64> {
        let mut values = Vec::with_capacity(kinds.len() * self.statistics.len());
        for kind in kinds {
            // Window rows are already in time order
            let series: Vec<f64> = window
                .rows
                .iter()
                .filter(|r| r.kind == *kind)
                .filter_map(|r| r.value)
                .collect();
            let stats = WindowStatistics::compute(&series);
            values.extend(self.statistics.iter().map(|s| s.select(&stats)));
        }
        values
    }
}

impl WindowFeatureExtractor for StatisticalExtractor {
    fn extract(&self, windows: &WindowTable) -> Result<FeatureMatrix, FeatureError> {
        let kinds = windows.kinds();
        let columns: Vec<String> = kinds
            .iter()
            .flat_map(|k| self.statistics.iter().map(move |s| s.feature_name(k)))
            .collect();

        let grouped = windows.windows();
        debug!(
            "Extracting {} features for {} windows on {} workers",
            columns.len(),
            grouped.len(),
            self.workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        // Indexed parallel collect keeps window order
        let rows: Vec<Vec<f64>> = pool.install(|| {
            grouped
                .par_iter()
                .map(|w| self.window_features(w, &kinds))
                .collect()
        });

        let mut matrix = FeatureMatrix::new(columns);
        for (window, row) in grouped.iter().zip(rows) {
            matrix.push_row(window.id.to_string(), row)?;
        }

        let imputed = impute(&mut matrix);
        info!(
            "Extracted {}x{} feature matrix ({} cells imputed)",
            matrix.len(),
            matrix.columns().len(),
            imputed
        );
        Ok(matrix)
    }
}

/// Replace non-finite feature cells column by column.
///
/// NaN becomes the column median, +inf the column maximum and -inf the column
/// minimum, all over the finite values of that column. A column without any
/// finite value becomes 0. Returns the number of replaced cells.
pub fn impute(matrix: &mut FeatureMatrix) -> usize {
    let mut replaced = 0;

    for col in 0..matrix.columns().len() {
        let column = matrix.column_values(col);
        let mut finite: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.len() == column.len() {
            continue;
        }

        let (nan_fill, pos_fill, neg_fill) = if finite.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let max = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let min = finite.iter().cloned().fold(f64::INFINITY, f64::min);
            (median_in_place(&mut finite), max, min)
        };

        for (row, value) in column.iter().enumerate() {
            let fill = if value.is_nan() {
                nan_fill
            } else if *value == f64::INFINITY {
                pos_fill
            } else if *value == f64::NEG_INFINITY {
                neg_fill
            } else {
                continue;
            };
            matrix.set_value(row, col, fill);
            replaced += 1;
        }
    }

    replaced
}

/// Reattach per-window metadata by a left join on window id.
///
/// `time_step` of the metadata is the window's anchor time; ids unknown to
/// the window table keep no metadata.
pub fn attach_metadata(mut features: FeatureMatrix, windows: &WindowTable) -> FeatureMatrix {
    let mut lookup: HashMap<&str, WindowMeta> = HashMap::new();
    for row in windows.rows() {
        lookup.entry(row.id.as_str()).or_insert(WindowMeta {
            vehicle_id: row.vehicle_id,
            time_step: row.anchor,
        });
    }

    for index in 0..features.len() {
        let meta = lookup.get(features.ids()[index].as_str()).copied();
        features.set_metadata(index, meta);
    }
    features
}
