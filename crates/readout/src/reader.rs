//! CSV Ingestion

use crate::table::{Readout, ReadoutTable, VehicleId, TIME_STEP_COLUMN, VEHICLE_ID_COLUMN};
use crate::ReadoutError;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Load a readout table from a CSV file.
///
/// The header must contain `vehicle_id` and `time_step`; every other column
/// is read as a numeric sensor channel in header order.
pub fn read_csv(path: &Path) -> Result<ReadoutTable, ReadoutError> {
    let rdr = csv::Reader::from_path(path)?;
    let table = read_records(rdr)?;
    info!(
        "Loaded {} readout rows ({} channels, {} vehicles) from {}",
        table.len(),
        table.channels().len(),
        table.vehicle_count(),
        path.display()
    );
    Ok(table)
}

/// Load a readout table from any CSV source
pub fn read_csv_from<R: io::Read>(source: R) -> Result<ReadoutTable, ReadoutError> {
    read_records(csv::Reader::from_reader(source))
}

fn read_records<R: io::Read>(mut rdr: csv::Reader<R>) -> Result<ReadoutTable, ReadoutError> {
    let headers = rdr.headers()?.clone();

    let col = |name: &'static str| -> Result<usize, ReadoutError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(ReadoutError::MissingColumn(name))
    };

    let i_vehicle = col(VEHICLE_ID_COLUMN)?;
    let i_time = col(TIME_STEP_COLUMN)?;

    let sensors: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != i_vehicle && *i != i_time)
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();
    debug!("CSV sensor channels: {}", sensors.len());

    let mut table = ReadoutTable::new(sensors.iter().map(|(_, name)| name.clone()).collect());

    for (row_num, result) in rdr.records().enumerate() {
        let record = result?;

        let vehicle_id = parse_vehicle_id(&record[i_vehicle]).ok_or_else(|| {
            ReadoutError::InvalidValue {
                row: row_num,
                column: VEHICLE_ID_COLUMN.to_string(),
                value: record[i_vehicle].to_string(),
            }
        })?;

        let time_step = record[i_time]
            .trim()
            .parse::<f64>()
            .map_err(|_| ReadoutError::InvalidValue {
                row: row_num,
                column: TIME_STEP_COLUMN.to_string(),
                value: record[i_time].to_string(),
            })?;

        let mut values = Vec::with_capacity(sensors.len());
        for (idx, name) in &sensors {
            let cell = &record[*idx];
            let value = parse_sensor(cell).map_err(|_| ReadoutError::InvalidValue {
                row: row_num,
                column: name.clone(),
                value: cell.to_string(),
            })?;
            values.push(value);
        }

        table.push(Readout::new(vehicle_id, time_step, values))?;
    }

    Ok(table)
}

/// Vehicle ids may be written as integers or integral floats ("12" or "12.0")
fn parse_vehicle_id(cell: &str) -> Option<VehicleId> {
    let cell = cell.trim();
    if let Ok(id) = cell.parse::<VehicleId>() {
        return Some(id);
    }
    let value = cell.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Some(value as VehicleId)
    } else {
        None
    }
}

/// Empty cells and NaN markers are missing values
fn parse_sensor(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let cell = cell.trim();
    if cell.is_empty()
        || cell.eq_ignore_ascii_case("nan")
        || cell.eq_ignore_ascii_case("na")
        || cell.eq_ignore_ascii_case("null")
    {
        return Ok(None);
    }
    let value = cell.parse::<f64>()?;
    Ok(if value.is_nan() { None } else { Some(value) })
}
