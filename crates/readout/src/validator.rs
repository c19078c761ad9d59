//! Readout Validation

use crate::table::ReadoutTable;
use crate::ReadoutError;
use std::collections::HashSet;
use tracing::debug;

/// Validator for caller-supplied readout tables
#[derive(Debug, Clone, Default)]
pub struct Validator {
    /// Exact row count required, if any
    expected_rows: Option<usize>,
}

impl Validator {
    /// Validator accepting any number of rows (batch path)
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator requiring exactly one readout row (interactive path)
    pub fn single_readout() -> Self {
        Self::expect_rows(1)
    }

    /// Validator requiring an exact row count
    pub fn expect_rows(count: usize) -> Self {
        Self {
            expected_rows: Some(count),
        }
    }

    /// Run every check
    pub fn validate(&self, table: &ReadoutTable) -> Result<(), ReadoutError> {
        self.validate_row_count(table)?;
        self.validate_time_steps(table)?;
        debug!("Validated {} readout rows", table.len());
        Ok(())
    }

    /// Check the row count against the configured expectation
    pub fn validate_row_count(&self, table: &ReadoutTable) -> Result<(), ReadoutError> {
        match self.expected_rows {
            Some(expected) if table.len() != expected => Err(ReadoutError::RowCount {
                expected,
                actual: table.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Time steps must be finite and unique within each vehicle
    pub fn validate_time_steps(&self, table: &ReadoutTable) -> Result<(), ReadoutError> {
        let mut seen = HashSet::with_capacity(table.len());
        for row in table.rows() {
            if !row.time_step.is_finite() {
                return Err(ReadoutError::NonFiniteTimeStep {
                    vehicle_id: row.vehicle_id,
                });
            }
            // -0.0 and 0.0 are the same time step
            let key = (row.vehicle_id, (row.time_step + 0.0).to_bits());
            if !seen.insert(key) {
                return Err(ReadoutError::DuplicateTimeStep {
                    vehicle_id: row.vehicle_id,
                    time_step: row.time_step,
                });
            }
        }
        Ok(())
    }
}
