//! Readout Table Data Model

use crate::ReadoutError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical name of the vehicle key column
pub const VEHICLE_ID_COLUMN: &str = "vehicle_id";
/// Canonical name of the time key column
pub const TIME_STEP_COLUMN: &str = "time_step";

/// Vehicle identifier
pub type VehicleId = u64;

/// One readout of a single vehicle at one time step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readout {
    pub vehicle_id: VehicleId,
    pub time_step: f64,
    /// Sensor values aligned with the table's channel list (`None` = missing)
    pub values: Vec<Option<f64>>,
}

impl Readout {
    /// Create a readout from its keys and sensor values
    pub fn new(vehicle_id: VehicleId, time_step: f64, values: Vec<Option<f64>>) -> Self {
        Self {
            vehicle_id,
            time_step,
            values,
        }
    }
}

/// All readouts of one vehicle, sorted by time step
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSeries {
    pub vehicle_id: VehicleId,
    pub rows: Vec<Readout>,
}

impl VehicleSeries {
    /// Values of one channel in time order
    pub fn column(&self, channel: usize) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.values[channel]).collect()
    }

    /// Overwrite one channel in time order
    pub fn set_column(&mut self, channel: usize, values: &[Option<f64>]) {
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values[channel] = *value;
        }
    }
}

/// Readout table keyed by (vehicle_id, time_step) with numeric sensor channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadoutTable {
    channels: Vec<String>,
    rows: Vec<Readout>,
}

impl ReadoutTable {
    /// Create an empty table with the given sensor channels
    pub fn new(channels: Vec<String>) -> Self {
        Self {
            channels,
            rows: Vec::new(),
        }
    }

    /// Create a table from rows, checking that every row matches the channel list
    pub fn from_rows(channels: Vec<String>, rows: Vec<Readout>) -> Result<Self, ReadoutError> {
        let mut table = Self::new(channels);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push(row)?;
        }
        Ok(table)
    }

    /// Reassemble a table from per-vehicle partitions, in partition order
    pub fn from_partitions(channels: Vec<String>, parts: Vec<VehicleSeries>) -> Self {
        let rows = parts.into_iter().flat_map(|p| p.rows).collect();
        Self { channels, rows }
    }

    /// Append a row
    pub fn push(&mut self, row: Readout) -> Result<(), ReadoutError> {
        if row.values.len() != self.channels.len() {
            return Err(ReadoutError::RowWidth {
                expected: self.channels.len(),
                actual: row.values.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Sensor channel names
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// All rows in table order
    pub fn rows(&self) -> &[Readout] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a channel in the value vectors
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c == name)
    }

    /// Values of one channel in table order
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.channel_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Number of distinct vehicles
    pub fn vehicle_count(&self) -> usize {
        let mut ids: Vec<VehicleId> = self.rows.iter().map(|r| r.vehicle_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Stable sort by (vehicle_id, time_step) ascending
    pub fn sort_by_vehicle_time(&mut self) {
        self.rows.sort_by(|a, b| {
            a.vehicle_id
                .cmp(&b.vehicle_id)
                .then(a.time_step.total_cmp(&b.time_step))
        });
    }

    /// Split into per-vehicle series, vehicles ascending, each sorted by time step.
    ///
    /// Every per-vehicle transform goes through this partition so that no
    /// computation ever sees rows of two vehicles at once.
    pub fn partition_by_vehicle(&self) -> Vec<VehicleSeries> {
        let mut groups: BTreeMap<VehicleId, Vec<Readout>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.vehicle_id).or_default().push(row.clone());
        }

        groups
            .into_iter()
            .map(|(vehicle_id, mut rows)| {
                rows.sort_by(|a, b| a.time_step.total_cmp(&b.time_step));
                VehicleSeries { vehicle_id, rows }
            })
            .collect()
    }

    /// Consume the table into its channel list and rows
    pub fn into_parts(self) -> (Vec<String>, Vec<Readout>) {
        (self.channels, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ReadoutTable {
        ReadoutTable::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                Readout::new(2, 5.0, vec![Some(1.0), None]),
                Readout::new(1, 3.0, vec![Some(2.0), Some(3.0)]),
                Readout::new(2, 1.0, vec![Some(4.0), Some(5.0)]),
                Readout::new(1, 1.5, vec![None, Some(6.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_push_rejects_wrong_width() {
        let mut table = ReadoutTable::new(vec!["a".into()]);
        let err = table.push(Readout::new(1, 0.0, vec![Some(1.0), Some(2.0)]));
        assert!(matches!(
            err,
            Err(ReadoutError::RowWidth {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_partition_is_sorted_and_isolated() {
        let parts = table().partition_by_vehicle();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].vehicle_id, 1);
        assert_eq!(parts[1].vehicle_id, 2);
        assert!(parts[0].rows.iter().all(|r| r.vehicle_id == 1));
        let times: Vec<f64> = parts[1].rows.iter().map(|r| r.time_step).collect();
        assert_eq!(times, vec![1.0, 5.0]);
    }

    #[test]
    fn test_sort_by_vehicle_time() {
        let mut t = table();
        t.sort_by_vehicle_time();
        let keys: Vec<(u64, f64)> = t.rows().iter().map(|r| (r.vehicle_id, r.time_step)).collect();
        assert_eq!(keys, vec![(1, 1.5), (1, 3.0), (2, 1.0), (2, 5.0)]);
    }

    #[test]
    fn test_column_lookup() {
        let t = table();
        assert_eq!(t.column("b").unwrap()[0], None);
        assert!(t.column("missing").is_none());
        assert_eq!(t.vehicle_count(), 2);
    }

    #[test]
    fn test_series_column_roundtrip() {
        let mut parts = table().partition_by_vehicle();
        parts[0].set_column(0, &[Some(9.0), Some(8.0)]);
        assert_eq!(parts[0].column(0), vec![Some(9.0), Some(8.0)]);
    }
}
