//! Readout Preprocessing
//!
//! Per-vehicle gap filling and differencing. Both transforms partition the
//! table by vehicle, map each series independently and reassemble the result
//! sorted by (vehicle_id, time_step).

mod difference;
mod interpolate;

pub use difference::{difference, difference_series, DIFF_SUFFIX};
pub use interpolate::{interpolate, interpolate_series};
