//! Telemetry observer hooks.

use vt_core::Tick;
use vt_dynamics::Snapshot;

use crate::AggregatedMetrics;

/// Callbacks invoked by [`DynamicsModel::run`][crate::DynamicsModel::run] as
/// the model produces snapshots.
///
/// All methods have default no-op implementations.  Collaborators that
/// publish telemetry override [`on_snapshot`][Self::on_snapshot]; those that
/// persist trip records override [`on_route_end`][Self::on_route_end].
///
/// # Example — DTC printer
///
/// ```rust,ignore
/// struct DtcPrinter;
///
/// impl TelemetryObserver for DtcPrinter {
///     fn on_trigger_update(&mut self, tick: Tick, snapshot: &Snapshot) {
///         if let Some(code) = &snapshot.dtc_code {
///             println!("{tick}: {} reported {code}", snapshot.vin);
///         }
///     }
/// }
/// ```
pub trait TelemetryObserver {
    /// Called after every tick with the newly retained snapshot.
    fn on_snapshot(&mut self, _tick: Tick, _snapshot: &Snapshot) {}

    /// Called on ticks where the surfaced trigger list or the DTC changed.
    fn on_trigger_update(&mut self, _tick: Tick, _snapshot: &Snapshot) {}

    /// Called once, on the tick the route ends, with the final snapshot and
    /// the trip metrics.
    fn on_route_end(&mut self, _snapshot: &Snapshot, _metrics: &AggregatedMetrics) {}

    /// Called when a run loop exits because the model stopped.
    fn on_stop(&mut self, _final_tick: Tick, _metrics: &AggregatedMetrics) {}
}

/// A [`TelemetryObserver`] that does nothing.
pub struct NoopObserver;

impl TelemetryObserver for NoopObserver {}
