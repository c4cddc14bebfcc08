//! Plain data row types written by output backends.

use vt_core::Tick;
use vt_dynamics::Snapshot;
use vt_route::Trigger;
use vt_sim::AggregatedMetrics;

/// One sampled telemetry record.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRow {
    pub vin:                    String,
    pub trip_id:                String,
    pub tick:                   u64,
    /// Unix milliseconds.
    pub timestamp:              i64,
    pub vehicle_speed:          f64,
    pub acceleration:           f64,
    pub engine_speed:           f64,
    pub torque_at_transmission: f64,
    pub gear:                   u8,
    pub accelerator:            f64,
    pub brake:                  f64,
    pub fuel_level:             f64,
    pub fuel_consumed:          f64,
    pub odometer:               f64,
    pub trip_odometer:          f64,
    pub oil_temp:               f64,
    pub latitude:               f64,
    pub longitude:              f64,
    pub bearing:                f64,
    pub route_stage:            usize,
    pub dtc_code:               Option<String>,
}

impl TelemetryRow {
    pub fn new(tick: Tick, s: &Snapshot) -> Self {
        Self {
            vin:                    s.vin.clone(),
            trip_id:                s.trip_id.clone(),
            tick:                   tick.0,
            timestamp:              s.timestamp,
            vehicle_speed:          s.vehicle_speed,
            acceleration:           s.acceleration,
            engine_speed:           s.engine_speed,
            torque_at_transmission: s.torque_at_transmission,
            gear:                   s.transmission_gear_position.number(),
            accelerator:            s.accelerator_pedal_position,
            brake:                  s.brake,
            fuel_level:             s.fuel_level,
            fuel_consumed:          s.fuel_consumed_since_restart,
            odometer:               s.odometer,
            trip_odometer:          s.trip_odometer,
            oil_temp:               s.oil_temp,
            latitude:               s.location.latitude,
            longitude:              s.location.longitude,
            bearing:                s.location.bearing,
            route_stage:            s.current_route_stage,
            dtc_code:               s.dtc_code.clone(),
        }
    }
}

/// A trigger record that surfaced on the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEventRow {
    pub vin:           String,
    pub trip_id:       String,
    pub tick:          u64,
    pub timestamp:     i64,
    pub kind:          &'static str,
    /// DTC code for `dtc` records.
    pub value:         Option<String>,
    pub trip_odometer: f64,
}

impl TriggerEventRow {
    pub fn new(tick: Tick, s: &Snapshot, trigger: &Trigger) -> Self {
        Self {
            vin:           s.vin.clone(),
            trip_id:       s.trip_id.clone(),
            tick:          tick.0,
            timestamp:     s.timestamp,
            kind:          trigger.kind.as_str(),
            value:         trigger.value.clone(),
            trip_odometer: s.trip_odometer,
        }
    }
}

/// Trip-level summary, written once per model.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRow {
    pub vin:                     String,
    pub trip_id:                 String,
    pub simulation_id:           String,
    pub start_time:              i64,
    pub end_time:                Option<i64>,
    pub route_ended:             bool,
    pub route_duration_ms:       Option<u64>,
    pub distance_km:             f64,
    pub odometer:                f64,
    pub mean_speed:              f64,
    pub mean_engine_speed:       f64,
    pub mean_oil_temp:           f64,
    pub fuel_consumed:           f64,
    pub fuel_level:              f64,
    pub high_speed_duration:     u64,
    pub idle_duration:           u64,
    pub high_acceleration_event: u32,
    pub high_braking_event:      u32,
    pub dtc_count:               usize,
}

impl TripRow {
    pub fn new(s: &Snapshot, m: &AggregatedMetrics) -> Self {
        Self {
            vin:                     s.vin.clone(),
            trip_id:                 s.trip_id.clone(),
            simulation_id:           s.simulation_id.clone(),
            start_time:              m.start_time,
            end_time:                m.end_time,
            route_ended:             s.route_ended,
            route_duration_ms:       s.route_duration_ms,
            distance_km:             s.trip_odometer,
            odometer:                m.odometer,
            mean_speed:              m.vehicle_speed.mean(),
            mean_engine_speed:       m.engine_speed.mean(),
            mean_oil_temp:           m.oil_temp.mean(),
            fuel_consumed:           m.fuel_consumed_since_restart,
            fuel_level:              m.fuel_level,
            high_speed_duration:     m.high_speed_duration,
            idle_duration:           m.idle_duration,
            high_acceleration_event: m.high_acceleration_event,
            high_braking_event:      m.high_braking_event,
            dtc_count:               s
                .triggers
                .iter()
                .filter(|t| t.kind == vt_route::TriggerKind::Dtc)
                .count(),
        }
    }
}
