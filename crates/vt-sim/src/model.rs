//! The `DynamicsModel` struct and its tick loop.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use vt_core::{Gear, IgnitionStatus, RandomSource, SimClock, SimConfig, Tick, VehicleRng};
use vt_dynamics::{Calculator, PipelineStep, RouteProgression, Snapshot, StepContext};
use vt_route::Route;

use crate::{AggregatedMetrics, Aggregator, SimError, SimResult, TelemetryObserver};

/// One simulated vehicle.
///
/// Owns the ordered calculator pipeline, the route state machine, the
/// aggregator, the current snapshot and the vehicle's random source.  Nothing
/// is shared with other models, so a fleet is just many independent
/// `DynamicsModel`s.
///
/// Each tick:
///
/// 1. Advance the clock and clone the current snapshot.
/// 2. Run every pipeline calculator on the *previous* snapshot, publishing
///    into the clone.
/// 3. Run route progression last and merge its outputs.
/// 4. Timestamp.  If the route ended: stop, engine off, ignition off.
/// 5. Check invariants; feed the aggregator; retain the new snapshot.
///
/// Create via [`ModelBuilder`][crate::ModelBuilder].
pub struct DynamicsModel<R: RandomSource = VehicleRng> {
    pub(crate) config:      SimConfig,
    pub(crate) clock:       SimClock,
    pub(crate) route:       Arc<Route>,
    pub(crate) pipeline:    Vec<Box<dyn PipelineStep>>,
    pub(crate) progression: RouteProgression,
    pub(crate) aggregator:  Aggregator,
    pub(crate) snapshot:    Snapshot,
    pub(crate) rng:         R,
    pub(crate) running:     bool,
}

impl<R: RandomSource> DynamicsModel<R> {
    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Mark the model as running.  Ticks are driven by [`run`][Self::run] or
    /// [`run_ticks`][Self::run_ticks]; this only sets the flag they check.
    /// Calling it again while running does nothing.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        info!(
            "vehicle {} trip {} started on route {} at {}",
            self.snapshot.vin, self.snapshot.trip_id, self.route.route_id, self.clock,
        );
    }

    /// Clear the running flag so [`run`][Self::run] returns after the current
    /// tick.  Calling it again while stopped does nothing.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        info!("vehicle {} stopped at {}", self.snapshot.vin, self.clock);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Put the vehicle in the journey-start state: engine running, ignition
    /// on, first gear.
    pub fn ignite(&mut self) {
        self.snapshot.engine_running = true;
        self.snapshot.ignition_status = IgnitionStatus::Run;
        self.snapshot.transmission_gear_position = Gear::First;
    }

    /// Zero all trip statistics and restart the trip clock at the current
    /// tick.
    pub fn reset_metrics(&mut self) {
        self.aggregator.reset(self.clock.elapsed_ms(), self.clock.current_unix_ms());
        self.aggregator.metrics().mirror_onto(&mut self.snapshot);
    }

    // ── Driver inputs ─────────────────────────────────────────────────────

    /// Steering wheel angle, degrees.  Positive turns right.  Read by the
    /// heading calculator on the next tick.
    pub fn set_steering_wheel_angle(&mut self, degrees: f64) {
        self.snapshot.steering_wheel_angle = degrees;
    }

    pub fn set_parking_brake(&mut self, engaged: bool) {
        self.snapshot.parking_brake_status = engaged;
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn aggregated_metrics(&self) -> &AggregatedMetrics {
        self.aggregator.metrics()
    }

    pub fn vehicle_speed(&self) -> f64 {
        self.snapshot.vehicle_speed
    }

    pub fn engine_speed(&self) -> f64 {
        self.snapshot.engine_speed
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn progression(&self) -> &RouteProgression {
        &self.progression
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Names of the pipeline calculators, in execution order.
    pub fn calculator_names(&self) -> Vec<&'static str> {
        self.pipeline
            .iter()
            .map(|step| step.name())
            .chain(std::iter::once(Calculator::name(&self.progression)))
            .collect()
    }

    // ── Ticking ───────────────────────────────────────────────────────────

    /// Run one tick and return the new snapshot.
    ///
    /// Works whether or not the clock is started; [`run`][Self::run] is the
    /// clock-driven loop around it.  On an invariant violation the model is
    /// stopped, the offending snapshot is discarded and the error returned.
    pub fn generate_snapshot(&mut self) -> SimResult<&Snapshot> {
        self.clock.advance();
        let tick = self.clock.current_tick;

        let mut next = {
            let ctx = StepContext {
                now_ms:  self.clock.elapsed_ms(),
                dt_secs: self.clock.tick_secs(),
                route:   &self.route,
            };
            let previous = &self.snapshot;
            let mut next = previous.clone();
            for step in &mut self.pipeline {
                step.step(previous, &mut next, &ctx, &mut self.rng);
            }
            self.progression.iterate(previous, &ctx, &mut self.rng);
            self.progression.publish(&mut next);
            next
        };

        next.timestamp = self.clock.current_unix_ms();

        if next.route_ended && !self.snapshot.route_ended {
            next.engine_running = false;
            next.ignition_status = IgnitionStatus::Off;
            info!(
                "vehicle {} finished route {} in {} ms, {:.3} km",
                next.vin,
                self.route.route_id,
                next.route_duration_ms.unwrap_or_default(),
                next.trip_odometer,
            );
            self.stop();
        }

        if let Err(reason) = next.check() {
            warn!("vehicle {} {}: {}", next.vin, tick, reason);
            self.stop();
            return Err(SimError::InvalidSnapshot { tick, reason });
        }

        if next.triggers_changed {
            debug!("vehicle {} {}: {} triggers surfaced", next.vin, tick, next.triggers.len());
        }

        self.aggregator.iterate(&next, self.clock.elapsed_ms(), next.timestamp);
        self.aggregator.metrics().mirror_onto(&mut next);
        self.snapshot = next;
        Ok(&self.snapshot)
    }

    /// Start the clock and tick until the model stops (route ended, invariant
    /// violation, or `max_ticks` reached).  Returns the final tick.
    ///
    /// With `SimConfig::realtime` the loop sleeps one tick period between
    /// ticks.
    pub fn run<O: TelemetryObserver>(&mut self, observer: &mut O) -> SimResult<Tick> {
        self.start();
        while self.running {
            if self.at_tick_cap() {
                info!("vehicle {} reached the tick cap at {}", self.snapshot.vin, self.clock);
                self.stop();
                break;
            }
            self.tick(observer)?;
            if self.running && self.config.realtime {
                std::thread::sleep(Duration::from_millis(self.config.tick_period_ms as u64));
            }
        }
        observer.on_stop(self.clock.current_tick, self.aggregator.metrics());
        Ok(self.clock.current_tick)
    }

    /// Start the clock and run at most `n` ticks, returning early if the model
    /// stops.  Ignores `max_ticks` and `realtime`.
    pub fn run_ticks<O: TelemetryObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<Tick> {
        self.start();
        for _ in 0..n {
            if !self.running {
                break;
            }
            self.tick(observer)?;
        }
        if !self.running {
            observer.on_stop(self.clock.current_tick, self.aggregator.metrics());
        }
        Ok(self.clock.current_tick)
    }

    fn tick<O: TelemetryObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        self.generate_snapshot()?;
        let tick = self.clock.current_tick;
        let snapshot = &self.snapshot;
        observer.on_snapshot(tick, snapshot);
        if snapshot.triggers_changed || snapshot.dtc_changed {
            observer.on_trigger_update(tick, snapshot);
        }
        if snapshot.route_ended && !self.running {
            observer.on_route_end(snapshot, self.aggregator.metrics());
        }
        Ok(())
    }

    fn at_tick_cap(&self) -> bool {
        self.config
            .max_ticks
            .is_some_and(|max| self.clock.current_tick.0 >= max)
    }
}
