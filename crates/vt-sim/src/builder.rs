//! Fluent builder for constructing a [`DynamicsModel`].

use std::sync::Arc;

use log::debug;

use vt_core::{
    GeoPoint, RandomSource, SimConfig, VehicleId, VehicleRng, generate_trip_id,
};
use vt_dynamics::{
    AccelerationCalc, BearingCalc, Calculator, EngineSpeedCalc, FuelConsumedCalc, FuelLevelCalc,
    FuelSpentCalc, GearCalc, HeadingCalc, LocationCalc, OdometerCalc, OilTempCalc, PipelineStep,
    RouteProgression, Snapshot, SpeedCalc, TorqueCalc,
};
use vt_route::Route;

use crate::{Aggregator, DynamicsModel, ModelParams, SimError, SimResult};

/// Fluent builder for [`DynamicsModel<R>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — tick period, seed, start time, …
/// - [`ModelParams`] — identity, starting odometer, tank capacity, and
///   (unless supplied via [`route`][Self::route]) the route
///
/// # Optional inputs (have defaults)
///
/// | Method                    | Default                                  |
/// |---------------------------|------------------------------------------|
/// | `.route(r)`               | `params.route`                           |
/// | `.vehicle(id)`            | RNG seeded from `config.seed` alone      |
/// | `.with_rng(r)`            | `VehicleRng::from_seed(config.seed)`     |
/// | `.with_heading()`         | heading calculator not registered        |
/// | `.initial_fuel_level(p)`  | 100 %                                    |
/// | `.ignited(b)`             | `true` (engine running, first gear)      |
///
/// # Example
///
/// ```rust,ignore
/// let mut model = ModelBuilder::new(config, ModelParams::new("VIN123"))
///     .route(Arc::new(route))
///     .build()?;
/// model.run(&mut NoopObserver)?;
/// ```
pub struct ModelBuilder<R: RandomSource = VehicleRng> {
    config:       SimConfig,
    params:       ModelParams,
    route:        Option<Arc<Route>>,
    rng:          R,
    heading:      bool,
    fuel_percent: f64,
    ignited:      bool,
}

impl ModelBuilder<VehicleRng> {
    /// Create a builder whose RNG is seeded from `config.seed`.
    pub fn new(config: SimConfig, params: ModelParams) -> Self {
        let rng = VehicleRng::from_seed(config.seed);
        Self {
            config,
            params,
            route:        None,
            rng,
            heading:      false,
            fuel_percent: 100.0,
            ignited:      true,
        }
    }

    /// Seed the RNG from `config.seed` mixed with `vehicle`, so fleet members
    /// sharing a config draw different streams.
    pub fn vehicle(mut self, vehicle: VehicleId) -> Self {
        self.rng = VehicleRng::new(self.config.seed, vehicle);
        self
    }
}

impl<R: RandomSource> ModelBuilder<R> {
    /// Replace the random source, e.g. with a scripted `SequenceRng`.
    pub fn with_rng<S: RandomSource>(self, rng: S) -> ModelBuilder<S> {
        ModelBuilder {
            config:       self.config,
            params:       self.params,
            route:        self.route,
            rng,
            heading:      self.heading,
            fuel_percent: self.fuel_percent,
            ignited:      self.ignited,
        }
    }

    /// Drive `route` instead of `params.route`.  Fleet members can share one
    /// `Arc`.
    pub fn route(mut self, route: Arc<Route>) -> Self {
        self.route = Some(route);
        self
    }

    /// Register the heading calculator after bearing.
    pub fn with_heading(mut self) -> Self {
        self.heading = true;
        self
    }

    /// Starting fuel level, percent of tank.
    pub fn initial_fuel_level(mut self, percent: f64) -> Self {
        self.fuel_percent = percent;
        self
    }

    /// Whether the model starts in the journey-start state.  With `false`
    /// the engine is off until [`DynamicsModel::ignite`] is called.
    pub fn ignited(mut self, ignited: bool) -> Self {
        self.ignited = ignited;
        self
    }

    /// Validate inputs, plan the trip, seed the initial snapshot and return a
    /// stopped model.
    pub fn build(self) -> SimResult<DynamicsModel<R>> {
        let mut config = self.config;
        let mut params = self.params;
        let mut rng = self.rng;

        // ── Validate ──────────────────────────────────────────────────────
        if let Some(start) = params.start_time_ms {
            config.start_unix_ms = start;
        }
        config.validate()?;

        let route = match self.route.or_else(|| params.route.take().map(Arc::new)) {
            Some(route) => route,
            None => return Err(SimError::MissingRoute),
        };
        route.validate()?;

        if !(params.fuel_tank_capacity.is_finite() && params.fuel_tank_capacity > 0.0) {
            return Err(SimError::Config(format!(
                "fuel_tank_capacity must be positive, got {}",
                params.fuel_tank_capacity,
            )));
        }
        if !(params.odometer.is_finite() && params.odometer >= 0.0) {
            return Err(SimError::Config(format!(
                "odometer must be finite and non-negative, got {}",
                params.odometer,
            )));
        }
        if !(self.fuel_percent.is_finite() && (0.0..=100.0).contains(&self.fuel_percent)) {
            return Err(SimError::Config(format!(
                "initial fuel level must be within 0..=100, got {}",
                self.fuel_percent,
            )));
        }

        let start = start_point(&params, &route)?;

        // ── Plan the trip ─────────────────────────────────────────────────
        let progression = RouteProgression::new(&route, params.odometer, &mut rng);
        let trip_id = generate_trip_id(&mut rng);

        let mut pipeline: Vec<Box<dyn PipelineStep>> = vec![
            Box::new(SpeedCalc::new()),
            Box::new(AccelerationCalc::new()),
            Box::new(GearCalc::default()),
            Box::new(TorqueCalc::new()),
            Box::new(EngineSpeedCalc::new()),
            Box::new(FuelConsumedCalc::new()),
            Box::new(OdometerCalc::new(params.odometer)),
            Box::new(FuelLevelCalc::new(self.fuel_percent)),
            Box::new(FuelSpentCalc::new()),
            Box::new(OilTempCalc::new()),
            Box::new(LocationCalc::new(start)),
            Box::new(BearingCalc::new()),
        ];
        if self.heading {
            pipeline.push(Box::new(HeadingCalc::new()));
        }

        // ── Seed the initial snapshot ─────────────────────────────────────
        let clock = config.make_clock();
        let mut snapshot = Snapshot {
            vin:                params.vin,
            device_id:          params.device_id,
            trip_id,
            simulation_id:      params.simulation_id,
            timestamp:          clock.current_unix_ms(),
            start_time:         clock.current_unix_ms(),
            fuel_tank_capacity: params.fuel_tank_capacity,
            ..Snapshot::default()
        };
        for step in &pipeline {
            step.seed(&mut snapshot);
        }
        Calculator::publish(&progression, &mut snapshot);

        debug!(
            "built model for {} on route {} ({} stages, {:.3} km){}",
            snapshot.vin,
            route.route_id,
            route.stage_count(),
            route.km,
            params.route_location.map(|at| format!(" from {at}")).unwrap_or_default(),
        );

        let mut model = DynamicsModel {
            aggregator: Aggregator::new(clock.elapsed_ms(), clock.current_unix_ms()),
            clock,
            config,
            route,
            pipeline,
            progression,
            snapshot,
            rng,
            running: false,
        };
        if self.ignited {
            model.ignite();
        }
        Ok(model)
    }
}

/// Explicit start coordinates when both are given, else the route's start.
fn start_point(params: &ModelParams, route: &Route) -> SimResult<GeoPoint> {
    match (params.latitude, params.longitude) {
        (Some(lat), Some(lon)) => {
            let point = GeoPoint::new(lat, lon);
            if !point.is_finite() {
                return Err(SimError::Config(format!("start position {point} is not finite")));
            }
            Ok(point)
        }
        _ => route.start().ok_or(SimError::MissingRoute),
    }
}
