//! Per-Vehicle Linear Interpolation

use readout::ReadoutTable;
use tracing::{debug, info};

/// Fill missing sensor values per vehicle by linear interpolation.
///
/// Output is sorted by (vehicle_id, time_step). Gaps at either end of a series
/// take the nearest observed value; a channel with no observed value for a
/// vehicle stays missing.
pub fn interpolate(table: &ReadoutTable) -> ReadoutTable {
    let channels = table.channels().to_vec();
    let mut parts = table.partition_by_vehicle();
    let mut filled_cells = 0usize;

    for series in &mut parts {
        for channel in 0..channels.len() {
            let column = series.column(channel);
            let filled = interpolate_series(&column);
            filled_cells += column
                .iter()
                .zip(&filled)
                .filter(|(before, after)| before.is_none() && after.is_some())
                .count();
            series.set_column(channel, &filled);
        }
        debug!(
            "Interpolated vehicle {} ({} rows)",
            series.vehicle_id,
            series.rows.len()
        );
    }

    info!(
        "Interpolation filled {} cells across {} vehicles",
        filled_cells,
        parts.len()
    );
    ReadoutTable::from_partitions(channels, parts)
}

/// Interpolate one series in time order.
///
/// Points are treated as equally spaced: interior gaps are filled along the
/// straight line between the neighbouring observed values by row position.
pub fn interpolate_series(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let observed: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .collect();

    let (Some(&(first_idx, first_val)), Some(&(last_idx, last_val))) =
        (observed.first(), observed.last())
    else {
        return values.to_vec();
    };

    let mut out = values.to_vec();

    for slot in &mut out[..first_idx] {
        *slot = Some(first_val);
    }
    for slot in &mut out[last_idx + 1..] {
        *slot = Some(last_val);
    }

    for pair in observed.windows(2) {
        let (i0, v0) = pair[0];
        let (i1, v1) = pair[1];
        let span = (i1 - i0) as f64;
        for (i, slot) in out.iter_mut().enumerate().take(i1).skip(i0 + 1) {
            let frac = (i - i0) as f64 / span;
            *slot = Some(v0 + (v1 - v0) * frac);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use readout::Readout;

    #[test]
    fn test_interior_gap() {
        let out = interpolate_series(&[Some(1.0), None, None, Some(4.0)]);
        assert_eq!(out, vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_boundaries_take_nearest_value() {
        let out = interpolate_series(&[None, Some(2.0), None, Some(6.0), None, None]);
        assert_eq!(
            out,
            vec![Some(2.0), Some(2.0), Some(4.0), Some(6.0), Some(6.0), Some(6.0)]
        );
    }

    #[test]
    fn test_all_missing_stays_missing() {
        let out = interpolate_series(&[None, None]);
        assert_eq!(out, vec![None, None]);
        assert!(interpolate_series(&[]).is_empty());
    }

    #[test]
    fn test_no_interpolation_across_vehicles() {
        let table = ReadoutTable::from_rows(
            vec!["s".into()],
            vec![
                Readout::new(1, 0.0, vec![Some(10.0)]),
                Readout::new(2, 0.0, vec![None]),
                Readout::new(1, 1.0, vec![None]),
                Readout::new(2, 1.0, vec![Some(100.0)]),
            ],
        )
        .unwrap();

        let out = interpolate(&table);
        let rows: Vec<(u64, f64, Option<f64>)> = out
            .rows()
            .iter()
            .map(|r| (r.vehicle_id, r.time_step, r.values[0]))
            .collect();
        assert_eq!(
            rows,
            vec![
                (1, 0.0, Some(10.0)),
                (1, 1.0, Some(10.0)),
                (2, 0.0, Some(100.0)),
                (2, 1.0, Some(100.0)),
            ]
        );
    }

    #[test]
    fn test_sorts_input_by_vehicle_and_time() {
        let table = ReadoutTable::from_rows(
            vec!["s".into()],
            vec![
                Readout::new(1, 3.0, vec![Some(3.0)]),
                Readout::new(1, 1.0, vec![Some(1.0)]),
                Readout::new(1, 2.0, vec![None]),
            ],
        )
        .unwrap();

        let out = interpolate(&table);
        let values: Vec<Option<f64>> = out.rows().iter().map(|r| r.values[0]).collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    proptest! {
        #[test]
        fn proptest_complete_table_is_unchanged(
            series in proptest::collection::vec(
                (0u64..4, proptest::collection::vec(-1e6f64..1e6, 2)),
                0..40,
            )
        ) {
            // time step = position within the generated list keeps keys unique
            let rows: Vec<Readout> = series
                .iter()
                .enumerate()
                .map(|(i, (v, vals))| Readout::new(*v, i as f64, vals.iter().map(|x| Some(*x)).collect()))
                .collect();
            let mut table = ReadoutTable::from_rows(vec!["a".into(), "b".into()], rows).unwrap();

            let out = interpolate(&table);
            table.sort_by_vehicle_time();
            prop_assert_eq!(out, table);
        }
    }
}
