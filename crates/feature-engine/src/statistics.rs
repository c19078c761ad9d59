//! Window Statistics Computation

use serde::{Deserialize, Serialize};

/// Per-window channel statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    Median,
    /// Population standard deviation
    StandardDeviation,
    Minimum,
    Maximum,
}

impl Statistic {
    /// Statistic set used by the deployed model
    pub const DEFAULT: [Statistic; 5] = [
        Statistic::Mean,
        Statistic::Median,
        Statistic::StandardDeviation,
        Statistic::Minimum,
        Statistic::Maximum,
    ];

    /// Name used in `<channel>__<statistic>` feature columns
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::StandardDeviation => "standard_deviation",
            Statistic::Minimum => "minimum",
            Statistic::Maximum => "maximum",
        }
    }

    /// Feature column name for a channel
    pub fn feature_name(&self, channel: &str) -> String {
        format!("{channel}__{}", self.name())
    }

    /// Pick this statistic out of a computed summary
    pub fn select(&self, stats: &WindowStatistics) -> f64 {
        match self {
            Statistic::Mean => stats.mean,
            Statistic::Median => stats.median,
            Statistic::StandardDeviation => stats.std_dev,
            Statistic::Minimum => stats.min,
            Statistic::Maximum => stats.max,
        }
    }
}

/// Summary statistics of one channel inside one window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl WindowStatistics {
    /// Summary with every statistic undefined
    pub fn undefined() -> Self {
        Self {
            mean: f64::NAN,
            median: f64::NAN,
            std_dev: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }

    /// Compute statistics from a slice of values.
    ///
    /// An empty slice yields NaN everywhere; those cells are imputed after
    /// extraction.
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::undefined();
        }

        let n = values.len() as f64;

        let mean = values.iter().sum::<f64>() / n;

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let m2: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        let std_dev = (m2 / n).sqrt();

        let mut sorted = values.to_vec();
        let median = median_in_place(&mut sorted);

        Self {
            mean,
            median,
            std_dev,
            min,
            max,
        }
    }
}

/// Median of a slice, sorting it in place. NaN for an empty slice.
pub(crate) fn median_in_place(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let stats = WindowStatistics::compute(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_population_std_dev() {
        let stats = WindowStatistics::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(WindowStatistics::compute(&[3.0, 1.0, 2.0]).median, 2.0);
        assert_eq!(WindowStatistics::compute(&[4.0, 1.0, 3.0, 2.0]).median, 2.5);
    }

    #[test]
    fn test_single_value() {
        let stats = WindowStatistics::compute(&[7.5]);
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.median, 7.5);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_empty_values_are_undefined() {
        let stats = WindowStatistics::compute(&[]);
        assert!(stats.mean.is_nan());
        assert!(stats.max.is_nan());
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(Statistic::StandardDeviation.feature_name("171_0"), "171_0__standard_deviation");
        let names: Vec<&str> = Statistic::DEFAULT.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["mean", "median", "standard_deviation", "minimum", "maximum"]);
    }
}
