//! Fixed Time-Index Sliding Windows
//!
//! Every distinct time step of a vehicle anchors one trailing window per
//! configured duration `w`, holding that vehicle's readings with
//! `anchor - w < time_step <= anchor`. A vehicle observed at a single time
//! step gets one fallback window per duration instead, tagged with
//! [`FALLBACK_SUFFIX`].

use crate::FeatureError;
use readout::{ReadoutTable, VehicleId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Suffix marking windows emitted by the single-observation fallback
pub const FALLBACK_SUFFIX: &str = "_fallback";

/// One melted (long-format) sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongReading {
    pub vehicle_id: VehicleId,
    pub time_step: f64,
    /// Sensor channel name
    pub kind: String,
    pub value: Option<f64>,
}

/// One reading assigned to a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRow {
    /// Window id, unique per (vehicle, anchor, window size)
    pub id: String,
    pub vehicle_id: VehicleId,
    pub time_step: f64,
    /// Anchor time of the window this row belongs to
    pub anchor: f64,
    pub kind: String,
    pub value: Option<f64>,
}

/// Borrowed view of all rows sharing one window id
#[derive(Debug, Clone)]
pub struct Window<'a> {
    pub id: &'a str,
    pub vehicle_id: VehicleId,
    pub anchor: f64,
    pub rows: Vec<&'a WindowRow>,
}

impl Window<'_> {
    /// Whether this window came from the single-observation fallback
    pub fn is_fallback(&self) -> bool {
        is_fallback_id(self.id)
    }
}

/// Long-format window table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowTable {
    rows: Vec<WindowRow>,
}

impl WindowTable {
    /// Wrap rows produced elsewhere
    pub fn from_rows(rows: Vec<WindowRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[WindowRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Group rows by window id, windows in first-appearance order
    pub fn windows(&self) -> Vec<Window<'_>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut windows: Vec<Window<'_>> = Vec::new();

        for row in &self.rows {
            let slot = *index.entry(row.id.as_str()).or_insert_with(|| {
                windows.push(Window {
                    id: row.id.as_str(),
                    vehicle_id: row.vehicle_id,
                    anchor: row.anchor,
                    rows: Vec::new(),
                });
                windows.len() - 1
            });
            windows[slot].rows.push(row);
        }

        windows
    }

    /// Channel names in first-appearance order
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = Vec::new();
        for row in &self.rows {
            if !kinds.iter().any(|k| *k == row.kind) {
                kinds.push(row.kind.clone());
            }
        }
        kinds
    }
}

/// Deterministic window id for a (vehicle, anchor, size) triple
pub fn window_id(vehicle_id: VehicleId, anchor: f64, size: f64, fallback: bool) -> String {
    let suffix = if fallback { FALLBACK_SUFFIX } else { "" };
    format!("vid{vehicle_id}_t{anchor}_w{size}{suffix}")
}

/// Whether a window id was produced by the fallback path
pub fn is_fallback_id(id: &str) -> bool {
    id.ends_with(FALLBACK_SUFFIX)
}

/// Melt a wide readout table into long format.
///
/// Readings are emitted channel by channel, then stably sorted by
/// (vehicle_id, time_step), so rows sharing a time step keep channel order.
pub fn melt(table: &ReadoutTable) -> Vec<LongReading> {
    let mut out = Vec::with_capacity(table.len() * table.channels().len());
    for (channel, kind) in table.channels().iter().enumerate() {
        for row in table.rows() {
            out.push(LongReading {
                vehicle_id: row.vehicle_id,
                time_step: row.time_step,
                kind: kind.clone(),
                value: row.values[channel],
            });
        }
    }
    sort_long(&mut out);
    out
}

/// Build windows from a wide readout table
pub fn build_windows(
    table: &ReadoutTable,
    window_sizes: &[f64],
) -> Result<WindowTable, FeatureError> {
    build_windows_long(melt(table), window_sizes)
}

/// Build windows from already melted readings.
///
/// Output is ordered by window size (as given), vehicle ascending, anchor
/// ascending; rows inside a window keep (time_step, channel) order.
pub fn build_windows_long(
    mut readings: Vec<LongReading>,
    window_sizes: &[f64],
) -> Result<WindowTable, FeatureError> {
    if let Some(&size) = window_sizes.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
        return Err(FeatureError::InvalidWindowSize(size));
    }
    if let Some(r) = readings.iter().find(|r| !r.time_step.is_finite()) {
        return Err(FeatureError::NonFiniteTimeStep(r.vehicle_id));
    }

    // Repeated sizes would produce colliding window ids
    let mut sizes: Vec<f64> = Vec::with_capacity(window_sizes.len());
    for &w in window_sizes {
        if !sizes.contains(&w) {
            sizes.push(w);
        }
    }

    sort_long(&mut readings);
    let groups = vehicle_groups(&readings);

    let mut rows = Vec::new();
    let mut window_count = 0usize;
    let mut fallback_count = 0usize;

    for &size in &sizes {
        for group in &groups {
            let vehicle_id = group[0].vehicle_id;
            let times: Vec<f64> = group.iter().map(|r| r.time_step).collect();
            let mut anchors = times.clone();
            anchors.dedup();

            if anchors.len() == 1 {
                let anchor = anchors[0];
                let id = window_id(vehicle_id, anchor, size, true);
                debug!("Vehicle {} has a single time step, emitting {}", vehicle_id, id);
                rows.extend(group.iter().map(|r| window_row(&id, anchor, r)));
                window_count += 1;
                fallback_count += 1;
                continue;
            }

            for &anchor in &anchors {
                // Half-open on the left, inclusive at the anchor
                let start = times.partition_point(|&t| t <= anchor - size);
                let end = times.partition_point(|&t| t <= anchor);
                if end <= start {
                    continue;
                }
                let id = window_id(vehicle_id, anchor, size, false);
                rows.extend(group[start..end].iter().map(|r| window_row(&id, anchor, r)));
                window_count += 1;
            }
        }
    }

    if rows.is_empty() {
        warn!("No windows formed, not even a fallback window; returning an empty window table");
    } else {
        info!(
            "Built {} windows ({} fallback) with {} rows for {} vehicles",
            window_count,
            fallback_count,
            rows.len(),
            groups.len()
        );
    }

    Ok(WindowTable { rows })
}

fn window_row(id: &str, anchor: f64, reading: &LongReading) -> WindowRow {
    WindowRow {
        id: id.to_string(),
        vehicle_id: reading.vehicle_id,
        time_step: reading.time_step,
        anchor,
        kind: reading.kind.clone(),
        value: reading.value,
    }
}

fn sort_long(readings: &mut [LongReading]) {
    readings.sort_by(|a, b| {
        a.vehicle_id
            .cmp(&b.vehicle_id)
            .then(a.time_step.total_cmp(&b.time_step))
    });
}

/// Contiguous per-vehicle slices of readings sorted by vehicle
fn vehicle_groups(readings: &[LongReading]) -> Vec<&[LongReading]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=readings.len() {
        if i == readings.len() || readings[i].vehicle_id != readings[start].vehicle_id {
            groups.push(&readings[start..i]);
            start = i;
        }
    }
    groups
}
