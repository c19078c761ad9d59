//! Per-Vehicle Differencing

use readout::ReadoutTable;
use tracing::info;

/// Suffix of the companion difference channels
pub const DIFF_SUFFIX: &str = "_diff";

/// Append a `<channel>_diff` column for every sensor channel.
///
/// Each diff is `value[t] - value[t-1]` in the vehicle's time order. Cells
/// without a difference (the first row of every vehicle, or a missing
/// neighbour) carry the vehicle's first observed value of the base channel,
/// so the first row holds a magnitude rather than a delta. Output is sorted
/// by (vehicle_id, time_step) with the diff channels after the originals.
pub fn difference(table: &ReadoutTable) -> ReadoutTable {
    let base = table.channels();
    let mut channels = base.to_vec();
    channels.extend(base.iter().map(|c| format!("{c}{DIFF_SUFFIX}")));

    let mut parts = table.partition_by_vehicle();
    for series in &mut parts {
        let diffs: Vec<Vec<Option<f64>>> = (0..base.len())
            .map(|channel| difference_series(&series.column(channel)))
            .collect();

        for (t, row) in series.rows.iter_mut().enumerate() {
            row.values.extend(diffs.iter().map(|d| d[t]));
        }
    }

    info!(
        "Added {} difference channels for {} vehicles",
        base.len(),
        parts.len()
    );
    ReadoutTable::from_partitions(channels, parts)
}

/// Successive differences of one series in time order, gaps filled with the
/// first observed value
pub fn difference_series(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let first = values.iter().flatten().next().copied();

    values
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let previous = i.checked_sub(1).and_then(|p| values[p]);
            let delta = match (previous, current) {
                (Some(prev), Some(cur)) => Some(cur - prev),
                _ => None,
            };
            delta.or(first)
        })
        .collect()
}
