//! The per-tick vehicle record.
//!
//! A `Snapshot` holds every simulated quantity at one tick.  The orchestrator
//! owns exactly two of them during a tick (previous and next) and hands out
//! shared references afterwards.
//!
//! | Group       | Fields                                                                 |
//! |-------------|------------------------------------------------------------------------|
//! | identity    | `vin`, `device_id`, `trip_id`, `simulation_id`                         |
//! | time        | `timestamp`, `start_time`, `end_time` (Unix ms)                        |
//! | controls    | accelerator, brake, steering, parking brake, manual, ignition          |
//! | powertrain  | speed, acceleration, engine speed, torque, gear                        |
//! | fuel        | consumed, level, spent, tank capacity                                  |
//! | distance    | odometer, trip odometer, location, heading                             |
//! | route       | stage, triggers, DTC, route ended / duration                           |
//! | trip stats  | durations and event counters mirrored from the aggregator             |

use vt_core::{Gear, GeoPoint, IgnitionStatus};
use vt_route::Trigger;

use thiserror::Error;

// ── Location ──────────────────────────────────────────────────────────────────

/// Position plus the current leg's bearing (degrees clockwise from north).
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub latitude:  f64,
    pub longitude: f64,
    pub bearing:   f64,
}

impl Location {
    pub fn at(point: GeoPoint) -> Self {
        Self { latitude: point.lat, longitude: point.lon, bearing: 0.0 }
    }

    #[inline]
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    #[inline]
    pub fn set_point(&mut self, point: GeoPoint) {
        self.latitude = point.lat;
        self.longitude = point.lon;
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    // Identity.
    pub vin:           String,
    pub device_id:     String,
    pub trip_id:       String,
    pub simulation_id: String,

    // Time, Unix milliseconds.
    pub timestamp:  i64,
    pub start_time: i64,
    pub end_time:   Option<i64>,

    // Driver controls.
    pub accelerator_pedal_position: f64,
    pub brake:                      f64,
    pub brake_pedal_status:         bool,
    pub steering_wheel_angle:       f64,
    pub parking_brake_status:       bool,
    pub manual_trans:               bool,
    pub engine_running:             bool,
    pub ignition_status:            IgnitionStatus,

    // Powertrain.
    pub vehicle_speed:              f64,
    pub acceleration:               f64,
    pub engine_speed:               f64,
    pub torque_at_transmission:     f64,
    pub transmission_gear_position: Gear,
    pub oil_temp:                   f64,

    // Fuel.
    pub fuel_consumed_since_restart: f64,
    pub fuel_level:                  f64,
    pub fuel_spent:                  f64,
    pub fuel_tank_capacity:          f64,

    // Distance and position.
    pub odometer:      f64,
    pub trip_odometer: f64,
    pub location:      Location,
    /// Degrees in `[0, 360)`.  Only advances when heading is enabled.
    pub heading:       f64,

    // Route.
    pub current_route_stage: usize,
    pub triggers:            Vec<Trigger>,
    pub triggers_changed:    bool,
    pub dtc_code:            Option<String>,
    pub dtc_changed:         bool,
    pub route_ended:         bool,
    pub route_duration_ms:   Option<u64>,

    // Trip statistics.
    pub high_speed_duration:     u64,
    pub idle_duration:           u64,
    pub high_acceleration_event: u32,
    pub high_braking_event:      u32,
}

/// A snapshot that breaks the per-tick invariants.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("field `{field}` is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("vehicle_speed is negative ({0})")]
    NegativeSpeed(f64),
}

impl Snapshot {
    /// Check the per-tick invariants: every numeric field finite and speed
    /// non-negative.  Gear range is guaranteed by [`Gear`].
    pub fn check(&self) -> Result<(), SnapshotError> {
        let fields: [(&'static str, f64); 17] = [
            ("accelerator_pedal_position",  self.accelerator_pedal_position),
            ("brake",                       self.brake),
            ("steering_wheel_angle",        self.steering_wheel_angle),
            ("vehicle_speed",               self.vehicle_speed),
            ("acceleration",                self.acceleration),
            ("engine_speed",                self.engine_speed),
            ("torque_at_transmission",      self.torque_at_transmission),
            ("oil_temp",                    self.oil_temp),
            ("fuel_consumed_since_restart", self.fuel_consumed_since_restart),
            ("fuel_level",                  self.fuel_level),
            ("fuel_spent",                  self.fuel_spent),
            ("fuel_tank_capacity",          self.fuel_tank_capacity),
            ("odometer",                    self.odometer),
            ("trip_odometer",               self.trip_odometer),
            ("latitude",                    self.location.latitude),
            ("longitude",                   self.location.longitude),
            ("heading",                     self.heading),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(SnapshotError::NonFinite { field, value });
            }
        }
        if !self.location.bearing.is_finite() {
            return Err(SnapshotError::NonFinite { field: "bearing", value: self.location.bearing });
        }
        if self.vehicle_speed < 0.0 {
            return Err(SnapshotError::NegativeSpeed(self.vehicle_speed));
        }
        Ok(())
    }

    /// Most recently surfaced DTC record, if any.
    pub fn latest_dtc(&self) -> Option<&Trigger> {
        self.triggers
            .iter()
            .rev()
            .find(|t| t.kind == vt_route::TriggerKind::Dtc)
    }
}
