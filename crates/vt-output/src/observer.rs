//! `OutputObserver<W>` — bridges `TelemetryObserver` to an `OutputWriter`.

use log::{debug, warn};

use vt_core::Tick;
use vt_dynamics::Snapshot;
use vt_route::Trigger;
use vt_sim::{AggregatedMetrics, TelemetryObserver};

use crate::row::{TelemetryRow, TriggerEventRow, TripRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Telemetry rows buffered before a write.
const BATCH_ROWS: usize = 256;

/// A [`TelemetryObserver`] that writes sampled telemetry, trigger events and
/// the trip summary to any [`OutputWriter`] backend.
///
/// Telemetry is sampled every `sample_every` ticks (default 1); the tick the
/// route ends is always written.  Errors from the writer are stored because
/// observer methods have no return value.  After `run()` returns, check with
/// [`take_error`][Self::take_error].
pub struct OutputObserver<W: OutputWriter> {
    writer:        W,
    sample_every:  u64,
    pending:       Vec<TelemetryRow>,
    last_triggers: Vec<Trigger>,
    last_snapshot: Option<Snapshot>,
    trip_written:  bool,
    last_error:    Option<OutputError>,
}

impl<W: OutputWriter> OutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            sample_every:  1,
            pending:       Vec::with_capacity(BATCH_ROWS),
            last_triggers: Vec::new(),
            last_snapshot: None,
            trip_written:  false,
            last_error:    None,
        }
    }

    /// Write telemetry on every `n`-th tick.  `0` is treated as `1`.
    pub fn sample_every(mut self, n: u64) -> Self {
        self.sample_every = n.max(1);
        self
    }

    /// Take the stored write error (if any) after `run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                warn!("telemetry output failed: {e}");
                self.last_error = Some(e);
            }
        }
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let result = self.writer.write_telemetry(&self.pending);
        self.pending.clear();
        self.store_err(result);
    }

    fn write_trip(&mut self, snapshot: &Snapshot, metrics: &AggregatedMetrics) {
        let result = self.writer.write_trip(&TripRow::new(snapshot, metrics));
        self.trip_written = true;
        self.store_err(result);
    }

    /// Records on `current` that were not on the previously seen list.  A list
    /// that does not extend the previous one (stage-configured triggers
    /// replace it) is new in full.
    fn new_records<'a>(&self, current: &'a [Trigger]) -> &'a [Trigger] {
        if current.starts_with(&self.last_triggers) {
            &current[self.last_triggers.len()..]
        } else {
            current
        }
    }
}

impl<W: OutputWriter> TelemetryObserver for OutputObserver<W> {
    fn on_snapshot(&mut self, tick: Tick, snapshot: &Snapshot) {
        if tick.0 % self.sample_every == 0 || snapshot.route_ended {
            self.pending.push(TelemetryRow::new(tick, snapshot));
            if self.pending.len() >= BATCH_ROWS {
                self.flush_pending();
            }
        }
        match &mut self.last_snapshot {
            Some(last) => last.clone_from(snapshot),
            None => self.last_snapshot = Some(snapshot.clone()),
        }
    }

    fn on_trigger_update(&mut self, tick: Tick, snapshot: &Snapshot) {
        if !snapshot.triggers_changed {
            return;
        }
        let rows: Vec<TriggerEventRow> = self
            .new_records(&snapshot.triggers)
            .iter()
            .map(|t| TriggerEventRow::new(tick, snapshot, t))
            .collect();
        for row in &rows {
            debug!("{} {}: {} trigger {:?}", row.vin, tick, row.kind, row.value);
            let result = self.writer.write_trigger_event(row);
            self.store_err(result);
        }
        self.last_triggers.clone_from(&snapshot.triggers);
    }

    fn on_route_end(&mut self, snapshot: &Snapshot, metrics: &AggregatedMetrics) {
        self.write_trip(snapshot, metrics);
    }

    fn on_stop(&mut self, _final_tick: Tick, metrics: &AggregatedMetrics) {
        self.flush_pending();
        // A run capped before the route ended still gets a trip row.
        if !self.trip_written {
            if let Some(last) = self.last_snapshot.take() {
                self.write_trip(&last, metrics);
            }
        }
        let result = self.writer.finish();
        self.store_err(result);
    }
}
