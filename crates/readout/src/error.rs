//! Readout Error Types

use thiserror::Error;

/// Errors while ingesting or validating readout tables
#[derive(Debug, Error)]
pub enum ReadoutError {
    /// Required key column absent from the input header
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// Cell that cannot be parsed for its column
    #[error("Row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// Row carries a different number of sensor values than the table has channels
    #[error("Row width mismatch: expected {expected} sensor values, got {actual}")]
    RowWidth { expected: usize, actual: usize },

    /// Same (vehicle, time step) key seen twice
    #[error("Duplicate time step {time_step} for vehicle {vehicle_id}")]
    DuplicateTimeStep { vehicle_id: u64, time_step: f64 },

    /// Time step is NaN or infinite
    #[error("Non-finite time step for vehicle {vehicle_id}")]
    NonFiniteTimeStep { vehicle_id: u64 },

    /// Wrong number of rows for the requested flow
    #[error("Expected exactly {expected} readout row(s), got {actual}")]
    RowCount { expected: usize, actual: usize },

    /// Underlying CSV or I/O failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
