//! `vt-output` — telemetry output writers for the rust_vt simulator.
//!
//! The CSV backend creates three files per output directory:
//!
//! | File                 | One row per                                       |
//! |----------------------|---------------------------------------------------|
//! | `telemetry.csv`      | sampled tick (every N ticks, plus the final tick) |
//! | `trigger_events.csv` | surfaced trigger record (DTC, oil temperature)    |
//! | `trips.csv`          | model run                                         |
//!
//! Backends implement [`OutputWriter`] and are driven by [`OutputObserver`],
//! which implements `vt_sim::TelemetryObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use vt_output::{CsvWriter, OutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = OutputObserver::new(writer).sample_every(5);
//! model.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv_file;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv_file::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::OutputObserver;
pub use row::{TelemetryRow, TriggerEventRow, TripRow};
pub use writer::OutputWriter;
