//! Readout Tables
//!
//! Time-indexed per-vehicle sensor readouts: the table model shared by every
//! pipeline stage, CSV ingestion and input validation.

mod error;
mod reader;
mod table;
mod validator;

pub use error::ReadoutError;
pub use reader::{read_csv, read_csv_from};
pub use table::{
    Readout, ReadoutTable, VehicleId, VehicleSeries, TIME_STEP_COLUMN, VEHICLE_ID_COLUMN,
};
pub use validator::Validator;
