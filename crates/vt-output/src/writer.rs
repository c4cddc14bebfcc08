//! The `OutputWriter` trait implemented by backend writers.

use crate::{OutputResult, TelemetryRow, TriggerEventRow, TripRow};

/// A sink for the three record kinds a simulated trip produces.
///
/// Observers swallow writer errors and keep the first one; see
/// [`OutputObserver::take_error`][crate::OutputObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of sampled telemetry rows.
    fn write_telemetry(&mut self, rows: &[TelemetryRow]) -> OutputResult<()>;

    /// Write one fired-trigger record.
    fn write_trigger_event(&mut self, row: &TriggerEventRow) -> OutputResult<()>;

    /// Write one completed (or capped) trip.
    fn write_trip(&mut self, row: &TripRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
