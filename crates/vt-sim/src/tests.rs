//! Unit and integration tests for vt-sim.

use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};

use vt_core::{Gear, GeoPoint, IgnitionStatus, SimConfig, Tick, VehicleId, VtError};
use vt_dynamics::Snapshot;
use vt_route::{Profile, Route, RouteError, RouteStage, TriggerKind, TriggerTemplate};

use crate::{
    AggregatedMetrics, Aggregator, DynamicsModel, ModelBuilder, ModelParams, NoopObserver,
    SimError, TelemetryObserver, run_fleet, run_fleet_with,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const START_MS: i64 = 1_700_000_000_000;

fn test_config() -> SimConfig {
    SimConfig {
        start_unix_ms: START_MS,
        seed:          42,
        max_ticks:     Some(20_000),
        ..SimConfig::default()
    }
}

/// Two 300 m legs, east then north.
fn short_route() -> Route {
    Route::new(
        "short",
        Profile::Normal,
        vec![
            RouteStage::new(0, GeoPoint::new(47.0, 8.0), GeoPoint::new(47.0, 8.004), 0.3),
            RouteStage::new(1, GeoPoint::new(47.0, 8.004), GeoPoint::new(47.0027, 8.004), 0.3),
        ],
    )
}

fn params() -> ModelParams {
    ModelParams {
        device_id:     "dev-1".into(),
        simulation_id: "sim-1".into(),
        odometer:      1_000.0,
        ..ModelParams::new("VIN0000000000001")
    }
}

fn build(route: Route) -> DynamicsModel {
    ModelBuilder::new(test_config(), params())
        .route(Arc::new(route))
        .build()
        .unwrap()
}

/// Records everything the model reports.
#[derive(Default)]
struct Recorder {
    snapshots:       Vec<Snapshot>,
    trigger_updates: Vec<Tick>,
    route_ends:      usize,
    stops:           Vec<Tick>,
    final_metrics:   Option<AggregatedMetrics>,
}

impl TelemetryObserver for Recorder {
    fn on_snapshot(&mut self, _tick: Tick, snapshot: &Snapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn on_trigger_update(&mut self, tick: Tick, _snapshot: &Snapshot) {
        self.trigger_updates.push(tick);
    }

    fn on_route_end(&mut self, _snapshot: &Snapshot, metrics: &AggregatedMetrics) {
        self.route_ends += 1;
        self.final_metrics = Some(metrics.clone());
    }

    fn on_stop(&mut self, final_tick: Tick, _metrics: &AggregatedMetrics) {
        self.stops.push(final_tick);
    }
}

// ── ModelBuilder ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn missing_route_rejected() {
        let result = ModelBuilder::new(test_config(), params()).build();
        assert!(matches!(result, Err(SimError::MissingRoute)));
    }

    #[test]
    fn route_from_params_accepted() {
        let model = ModelBuilder::new(test_config(), params().with_route(short_route()))
            .build()
            .unwrap();
        assert_eq!(model.route().route_id, "short");
    }

    #[test]
    fn empty_route_rejected() {
        let result = ModelBuilder::new(test_config(), params())
            .route(Arc::new(Route::new("empty", Profile::Normal, vec![])))
            .build();
        assert!(matches!(result, Err(SimError::Route(RouteError::Empty))));
    }

    #[test]
    fn zero_tick_period_rejected() {
        let config = SimConfig { tick_period_ms: 0, ..test_config() };
        let result = ModelBuilder::new(config, params())
            .route(Arc::new(short_route()))
            .build();
        assert!(matches!(result, Err(SimError::Core(VtError::Config(_)))));
    }

    #[test]
    fn non_positive_tank_rejected() {
        let params = ModelParams { fuel_tank_capacity: 0.0, ..params() };
        let result = ModelBuilder::new(test_config(), params)
            .route(Arc::new(short_route()))
            .build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn negative_odometer_rejected() {
        let params = ModelParams { odometer: -1.0, ..params() };
        let result = ModelBuilder::new(test_config(), params)
            .route(Arc::new(short_route()))
            .build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn initial_snapshot_is_journey_start() {
        let model = build(short_route());
        let s = model.snapshot();

        assert!(!model.is_running());
        assert!(s.check().is_ok());
        assert_eq!(s.vin, "VIN0000000000001");
        assert_eq!(s.device_id, "dev-1");
        assert_eq!(s.simulation_id, "sim-1");
        assert_eq!(s.trip_id.len(), vt_core::ids::TRIP_ID_LEN);
        assert!(s.engine_running);
        assert_eq!(s.ignition_status, IgnitionStatus::Run);
        assert_eq!(s.transmission_gear_position, Gear::First);
        assert_eq!(s.timestamp, START_MS);
        assert_eq!(s.start_time, START_MS);
        assert_eq!(s.current_route_stage, 0);
        assert_eq!(s.vehicle_speed, 0.0);
        assert_relative_eq!(s.odometer, 1_000.0);
        assert_relative_eq!(s.fuel_level, 100.0);
        assert_relative_eq!(s.fuel_tank_capacity, 40.0);
        assert!((10.0..40.0).contains(&s.accelerator_pedal_position));
        assert_eq!(s.location.point(), GeoPoint::new(47.0, 8.0));
    }

    #[test]
    fn explicit_start_position_and_time() {
        let params = ModelParams {
            latitude:      Some(47.5),
            longitude:     Some(8.5),
            start_time_ms: Some(5_000),
            ..params()
        };
        let model = ModelBuilder::new(test_config(), params)
            .route(Arc::new(short_route()))
            .build()
            .unwrap();
        assert_eq!(model.snapshot().location.point(), GeoPoint::new(47.5, 8.5));
        assert_eq!(model.snapshot().timestamp, 5_000);
        assert_eq!(model.aggregated_metrics().start_time, 5_000);
    }

    #[test]
    fn not_ignited_leaves_engine_off() {
        let model = ModelBuilder::new(test_config(), params())
            .route(Arc::new(short_route()))
            .ignited(false)
            .build()
            .unwrap();
        assert!(!model.snapshot().engine_running);
        assert_eq!(model.snapshot().ignition_status, IgnitionStatus::Off);
    }

    #[test]
    fn default_pipeline_order() {
        let model = build(short_route());
        assert_eq!(
            model.calculator_names(),
            vec![
                "vehicle_speed",
                "acceleration",
                "transmission_gear_position",
                "torque_at_transmission",
                "engine_speed",
                "fuel_consumed_since_restart",
                "odometer",
                "fuel_level",
                "fuel_spent",
                "oil_temp",
                "location",
                "bearing",
                "route_stage",
            ]
        );
    }

    #[test]
    fn heading_registered_before_route_stage() {
        let model = ModelBuilder::new(test_config(), params())
            .route(Arc::new(short_route()))
            .with_heading()
            .build()
            .unwrap();
        let names = model.calculator_names();
        assert_eq!(&names[names.len() - 2..], &["heading", "route_stage"]);
    }
}

// ── Lifecycle and ticking ─────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut model = build(short_route());
        model.start();
        model.start();
        assert!(model.is_running());
        model.stop();
        model.stop();
        assert!(!model.is_running());
    }

    #[test]
    fn start_alone_does_not_tick() {
        let mut model = build(short_route());
        let before = model.snapshot().clone();
        model.start();
        assert_eq!(model.clock().current_tick, Tick(0));
        assert_eq!(model.snapshot(), &before);
    }

    #[test]
    fn ticks_advance_simulated_time() {
        let mut model = build(short_route());
        for _ in 0..3 {
            model.generate_snapshot().unwrap();
        }
        assert_eq!(model.clock().current_tick, Tick(3));
        assert_eq!(model.snapshot().timestamp, START_MS + 3_000);
    }

    #[test]
    fn first_tick_moves_the_vehicle() {
        let mut model = build(short_route());
        let s = model.generate_snapshot().unwrap().clone();
        assert!(s.vehicle_speed > 0.0);
        assert_eq!(s.odometer, 1_000.0, "odometer reads the previous speed, which was 0");
        model.generate_snapshot().unwrap();
        assert!(model.snapshot().odometer > 1_000.0);
    }

    #[test]
    fn run_ticks_keeps_running() {
        let mut model = build(short_route());
        let mut rec = Recorder::default();
        let tick = model.run_ticks(3, &mut rec).unwrap();
        assert_eq!(tick, Tick(3));
        assert!(model.is_running());
        assert_eq!(rec.snapshots.len(), 3);
        assert!(rec.stops.is_empty());
    }

    #[test]
    fn max_ticks_caps_run() {
        let config = SimConfig { max_ticks: Some(5), ..test_config() };
        let mut model = ModelBuilder::new(config, params())
            .route(Arc::new(short_route()))
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        let tick = model.run(&mut rec).unwrap();
        assert_eq!(tick, Tick(5));
        assert!(!model.is_running());
        assert!(!model.snapshot().route_ended);
        assert_eq!(rec.stops, vec![Tick(5)]);
        assert_eq!(rec.route_ends, 0);
    }

    #[test]
    fn invalid_snapshot_stops_model_and_is_discarded() {
        let mut model = build(short_route());
        model.start();
        model.set_steering_wheel_angle(f64::NAN);
        let result = model.generate_snapshot().map(|_| ());
        assert!(matches!(
            result,
            Err(SimError::InvalidSnapshot { tick: Tick(1), .. })
        ));
        assert!(!model.is_running());
        assert_eq!(model.snapshot().timestamp, START_MS);
    }
}

// ── Full trips ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod trips {
    use super::*;

    #[test]
    fn runs_to_route_end() {
        let mut model = build(short_route());
        let mut rec = Recorder::default();
        let tick = model.run(&mut rec).unwrap();
        let s = model.snapshot();

        assert!(s.route_ended);
        assert!(!model.is_running());
        assert!(!s.engine_running);
        assert_eq!(s.ignition_status, IgnitionStatus::Off);
        assert_eq!(s.current_route_stage, 2);
        assert_eq!(s.route_duration_ms, Some(tick.0 * 1_000));
        assert_eq!(s.end_time, Some(s.timestamp));
        assert!(s.trip_odometer >= 0.6 - 1e-9);
        assert_abs_diff_eq!(s.location.latitude, 47.0027, epsilon = 1e-12);
        assert_abs_diff_eq!(s.location.longitude, 8.004, epsilon = 1e-12);

        assert_eq!(rec.snapshots.len() as u64, tick.0);
        assert_eq!(rec.route_ends, 1);
        assert_eq!(rec.stops, vec![tick]);
    }

    #[test]
    fn every_tick_satisfies_invariants() {
        let mut model = build(short_route());
        let mut rec = Recorder::default();
        model.run(&mut rec).unwrap();

        assert_eq!(rec.snapshots[0].current_route_stage, 0);
        for (i, pair) in rec.snapshots.windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(b.check().is_ok(), "tick {} invalid", i + 2);
            assert!(b.odometer >= a.odometer);
            assert!(b.fuel_consumed_since_restart >= a.fuel_consumed_since_restart);
            assert_eq!(b.timestamp - a.timestamp, 1_000);
            assert!(b.current_route_stage >= a.current_route_stage);
            // Route progression reads the previous tick's odometer.
            assert_relative_eq!(b.trip_odometer, a.odometer - 1_000.0);
        }
    }

    #[test]
    fn burndown_lasts_twenty_seconds() {
        let mut model = build(short_route());
        let mut rec = Recorder::default();
        let end = model.run(&mut rec).unwrap();

        let burndown_tick = rec
            .snapshots
            .iter()
            .position(|s| s.current_route_stage == 2)
            .map(|i| i as u64 + 1)
            .unwrap();
        assert_eq!(end.0 - burndown_tick, 20);
        for s in &rec.snapshots[burndown_tick as usize - 1..end.0 as usize - 1] {
            assert_eq!(s.accelerator_pedal_position, 0.0);
            assert_eq!(s.brake, 100.0);
            assert!(s.brake_pedal_status);
        }
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let route = short_route().with_trigger(TriggerTemplate::new(TriggerKind::Dtc, 2));
        let mut a = build(route.clone());
        let mut b = build(route);
        a.run(&mut NoopObserver).unwrap();
        b.run(&mut NoopObserver).unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.aggregated_metrics(), b.aggregated_metrics());
        assert_eq!(a.progression().planned_triggers(), b.progression().planned_triggers());
    }

    #[test]
    fn vehicles_draw_different_streams() {
        let a = ModelBuilder::new(test_config(), params())
            .vehicle(VehicleId(1))
            .route(Arc::new(short_route()))
            .build()
            .unwrap();
        let b = ModelBuilder::new(test_config(), params())
            .vehicle(VehicleId(2))
            .route(Arc::new(short_route()))
            .build()
            .unwrap();
        assert_ne!(a.snapshot().trip_id, b.snapshot().trip_id);
    }

    #[test]
    fn dtc_trigger_reported_to_observer() {
        let route = short_route().with_trigger(TriggerTemplate::new(TriggerKind::Dtc, 1));
        let mut model = build(route);
        let mut rec = Recorder::default();
        model.run(&mut rec).unwrap();

        assert_eq!(rec.trigger_updates.len(), 1);
        let tick = rec.trigger_updates[0];
        let at = &rec.snapshots[tick.0 as usize - 1];
        assert!(at.triggers_changed);
        assert!(at.dtc_changed);
        assert!(at.dtc_code.is_some());
        assert_eq!(at.latest_dtc().and_then(|t| t.value.clone()), at.dtc_code);

        let last = model.snapshot();
        assert_eq!(last.dtc_code, at.dtc_code);
        assert!(!last.dtc_changed);
        assert_eq!(last.triggers.len(), 1);
        assert_eq!(last.triggers[0].kind, TriggerKind::Dtc);
    }

    #[test]
    fn trip_fields_mirrored_on_snapshot() {
        let mut model = build(short_route());
        let mut rec = Recorder::default();
        model.run(&mut rec).unwrap();

        let metrics = rec.final_metrics.unwrap();
        let s = model.snapshot();
        assert_eq!(&metrics, model.aggregated_metrics());
        assert_eq!(s.start_time, metrics.start_time);
        assert_eq!(s.end_time, metrics.end_time);
        assert_eq!(s.idle_duration, metrics.idle_duration);
        assert_eq!(s.high_speed_duration, metrics.high_speed_duration);
        assert_eq!(s.high_acceleration_event, metrics.high_acceleration_event);
        assert_eq!(s.high_braking_event, metrics.high_braking_event);
        assert_eq!(metrics.vehicle_speed.count(), rec.snapshots.len() as u64);
        assert_eq!(metrics.ignition_status, IgnitionStatus::Off);
        assert_relative_eq!(metrics.odometer, s.odometer);
    }

    #[test]
    fn reset_metrics_restarts_trip_clock() {
        let mut model = build(short_route());
        for _ in 0..5 {
            model.generate_snapshot().unwrap();
        }
        assert_eq!(model.aggregated_metrics().vehicle_speed.count(), 5);

        model.reset_metrics();
        let m = model.aggregated_metrics();
        assert_eq!(m.vehicle_speed.count(), 0);
        assert_eq!(m.start_time, START_MS + 5_000);
        assert_eq!(model.snapshot().start_time, START_MS + 5_000);
    }
}

// ── Aggregator ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod aggregator {
    use super::*;

    fn at(speed: f64, ignition: IgnitionStatus) -> Snapshot {
        Snapshot { vehicle_speed: speed, ignition_status: ignition, ..Snapshot::default() }
    }

    #[test]
    fn running_means() {
        let mut agg = Aggregator::new(0, 0);
        for (i, v) in [10.0, 20.0, 30.0].into_iter().enumerate() {
            let ms = (i as u64 + 1) * 1_000;
            agg.iterate(&at(v, IgnitionStatus::Run), ms, ms as i64);
        }
        assert_relative_eq!(agg.metrics().vehicle_speed.mean(), 20.0);
        assert_eq!(agg.metrics().vehicle_speed.count(), 3);
    }

    #[test]
    fn high_speed_and_idle_durations() {
        let mut agg = Aggregator::new(0, 0);
        agg.iterate(&at(120.0, IgnitionStatus::Run), 1_000, 1_000);
        agg.iterate(&at(120.0, IgnitionStatus::Run), 2_000, 2_000);
        agg.iterate(&at(0.5, IgnitionStatus::Run), 3_000, 3_000);
        agg.iterate(&at(0.0, IgnitionStatus::Off), 4_000, 4_000);
        assert_eq!(agg.metrics().high_speed_duration, 2_000);
        assert_eq!(agg.metrics().idle_duration, 1_000);
    }

    #[test]
    fn acceleration_and_braking_events() {
        let mut agg = Aggregator::new(0, 0);
        agg.iterate(&at(0.0, IgnitionStatus::Run), 1_000, 1_000);
        agg.iterate(&at(15.0, IgnitionStatus::Run), 2_000, 2_000);
        assert_eq!(agg.metrics().high_acceleration_event, 1);

        let braking = Snapshot { brake: 100.0, ..at(0.0, IgnitionStatus::Run) };
        agg.iterate(&braking, 3_000, 3_000);
        assert_eq!(agg.metrics().high_braking_event, 0, "a drop of 15 is not hard braking");

        agg.iterate(&at(30.0, IgnitionStatus::Run), 4_000, 4_000);
        let hard = Snapshot { brake: 100.0, ..at(10.0, IgnitionStatus::Run) };
        agg.iterate(&hard, 5_000, 5_000);
        assert_eq!(agg.metrics().high_braking_event, 1);
        assert_eq!(agg.metrics().high_acceleration_event, 2);
    }

    #[test]
    fn end_time_stamped_once_on_ignition_off() {
        let mut agg = Aggregator::new(0, 100);
        agg.iterate(&at(10.0, IgnitionStatus::Run), 1_000, 1_100);
        assert_eq!(agg.metrics().end_time, None);
        agg.iterate(&at(0.0, IgnitionStatus::Off), 2_000, 2_100);
        agg.iterate(&at(0.0, IgnitionStatus::Off), 3_000, 3_100);
        assert_eq!(agg.metrics().start_time, 100);
        assert_eq!(agg.metrics().end_time, Some(2_100));
    }

    #[test]
    fn last_seen_fields_follow_latest_snapshot() {
        let mut agg = Aggregator::new(0, 0);
        let mut s = at(40.0, IgnitionStatus::Run);
        s.transmission_gear_position = Gear::Third;
        s.odometer = 12.5;
        s.fuel_level = 80.0;
        s.location.latitude = 47.0;
        s.location.longitude = 8.0;
        agg.iterate(&s, 1_000, 1_000);

        let m = agg.metrics();
        assert_eq!(m.transmission_gear_position, Gear::Third);
        assert_relative_eq!(m.odometer, 12.5);
        assert_relative_eq!(m.fuel_level, 80.0);
        assert_relative_eq!(m.latitude, 47.0);
        assert_relative_eq!(m.longitude, 8.0);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut agg = Aggregator::new(0, 0);
        agg.iterate(&at(120.0, IgnitionStatus::Run), 1_000, 1_000);
        agg.reset(1_000, 9_000);
        let m = agg.metrics();
        assert_eq!(m.vehicle_speed.count(), 0);
        assert_eq!(m.high_speed_duration, 0);
        assert_eq!(m.start_time, 9_000);
        assert_eq!(m.end_time, None);
    }
}

// ── Fleet ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fleet {
    use super::*;

    fn fleet(n: u32) -> Vec<DynamicsModel> {
        let route = Arc::new(short_route());
        (0..n)
            .map(|i| {
                ModelBuilder::new(test_config(), ModelParams::new(format!("VIN{i}")))
                    .vehicle(VehicleId(i))
                    .route(Arc::clone(&route))
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn every_vehicle_finishes() {
        let mut models = fleet(4);
        let results = run_fleet(&mut models);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(models.iter().all(|m| m.snapshot().route_ended));
    }

    #[test]
    fn observers_returned_in_model_order() {
        let mut models = fleet(3);
        let observers = (0..3).map(|_| Recorder::default()).collect();
        let results = run_fleet_with(&mut models, observers).unwrap();
        for ((result, rec), model) in results.iter().zip(&models) {
            let tick = result.as_ref().unwrap();
            assert_eq!(rec.snapshots.len() as u64, tick.0);
            assert_eq!(rec.snapshots.last(), Some(model.snapshot()));
            assert_eq!(rec.route_ends, 1);
        }
    }

    #[test]
    fn observer_count_must_match() {
        let mut models = fleet(2);
        let result = run_fleet_with(&mut models, vec![NoopObserver]);
        assert!(matches!(result, Err(SimError::Config(_))));
        assert!(models.iter().all(|m| m.clock().current_tick == Tick(0)));
    }

    #[test]
    fn failing_vehicle_is_isolated() {
        let mut models = fleet(3);
        models[1].set_steering_wheel_angle(f64::NAN);
        let results = run_fleet(&mut models);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SimError::InvalidSnapshot { .. })));
        assert!(results[2].is_ok());
        assert!(models[2].snapshot().route_ended);
    }
}
