//! Trip-level statistics.
//!
//! The aggregator sees every retained snapshot once, in order, and keeps:
//!
//! | Kind        | Quantities                                                        |
//! |-------------|-------------------------------------------------------------------|
//! | running mean| speed, engine speed, torque, oil temp, accelerator, brake         |
//! | last seen   | ignition, brake pedal, gear, odometer, fuel level/consumed, lat/lon|
//! | durations   | `high_speed_duration` (> 112.6 km/h), `idle_duration` (run, ≤ 1)  |
//! | counters    | `high_acceleration_event` (≥ 12), `high_braking_event` (< -16)    |
//! | timestamps  | `start_time`, `end_time` (stamped when ignition goes off)         |
//!
//! Durations are simulated milliseconds.  Acceleration is km/h per second over
//! windows of at least one second.

use vt_core::{Gear, IgnitionStatus};
use vt_dynamics::Snapshot;

const HIGH_SPEED_KMH: f64 = 112.6;
const IDLE_SPEED_KMH: f64 = 1.0;
const HIGH_ACCELERATION: f64 = 12.0;
const HIGH_BRAKING: f64 = -16.0;
const ACCEL_WINDOW_MS: u64 = 1_000;

// ── RunningMean ───────────────────────────────────────────────────────────────

/// Incremental mean: `mean' = (mean·n + v) / (n + 1)`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunningMean {
    mean:  f64,
    count: u64,
}

impl RunningMean {
    #[inline]
    pub fn push(&mut self, value: f64) {
        let n = self.count as f64;
        self.mean = (self.mean * n + value) / (n + 1.0);
        self.count += 1;
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }
}

// ── AggregatedMetrics ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregatedMetrics {
    pub vehicle_speed:              RunningMean,
    pub engine_speed:               RunningMean,
    pub torque_at_transmission:     RunningMean,
    pub oil_temp:                   RunningMean,
    pub accelerator_pedal_position: RunningMean,
    pub brake:                      RunningMean,

    pub ignition_status:             IgnitionStatus,
    pub brake_pedal_status:          bool,
    pub transmission_gear_position:  Gear,
    pub odometer:                    f64,
    pub fuel_level:                  f64,
    pub fuel_consumed_since_restart: f64,
    pub latitude:                    f64,
    pub longitude:                   f64,

    pub high_speed_duration:     u64,
    pub idle_duration:           u64,
    pub high_acceleration_event: u32,
    pub high_braking_event:      u32,

    pub start_time: i64,
    pub end_time:   Option<i64>,
}

impl AggregatedMetrics {
    fn starting_at(start_time: i64) -> Self {
        Self { start_time, ..Self::default() }
    }

    /// Copy the trip-level fields onto `snapshot`, so the final published
    /// snapshot carries a complete trip record.
    pub fn mirror_onto(&self, snapshot: &mut Snapshot) {
        snapshot.start_time = self.start_time;
        snapshot.end_time = self.end_time;
        snapshot.high_speed_duration = self.high_speed_duration;
        snapshot.idle_duration = self.idle_duration;
        snapshot.high_acceleration_event = self.high_acceleration_event;
        snapshot.high_braking_event = self.high_braking_event;
    }
}

// ── Aggregator ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Aggregator {
    metrics:           AggregatedMetrics,
    last_ms:           u64,
    accel_last_ms:     u64,
    accel_start_speed: f64,
    last_ignition:     Option<IgnitionStatus>,
}

impl Aggregator {
    /// Start aggregating at simulated time `now_ms` (Unix `unix_ms`).
    pub fn new(now_ms: u64, unix_ms: i64) -> Self {
        Self {
            metrics:           AggregatedMetrics::starting_at(unix_ms),
            last_ms:           now_ms,
            accel_last_ms:     now_ms,
            accel_start_speed: 0.0,
            last_ignition:     None,
        }
    }

    /// Zero every mean, counter and duration and restart the trip clock.
    pub fn reset(&mut self, now_ms: u64, unix_ms: i64) {
        *self = Self::new(now_ms, unix_ms);
    }

    pub fn metrics(&self) -> &AggregatedMetrics {
        &self.metrics
    }

    /// Fold one snapshot, observed at simulated `now_ms`, into the metrics.
    pub fn iterate(&mut self, snapshot: &Snapshot, now_ms: u64, unix_ms: i64) {
        let elapsed = now_ms.saturating_sub(self.last_ms);
        let m = &mut self.metrics;

        m.vehicle_speed.push(snapshot.vehicle_speed);
        m.engine_speed.push(snapshot.engine_speed);
        m.torque_at_transmission.push(snapshot.torque_at_transmission);
        m.oil_temp.push(snapshot.oil_temp);
        m.accelerator_pedal_position.push(snapshot.accelerator_pedal_position);
        m.brake.push(snapshot.brake);

        m.ignition_status = snapshot.ignition_status;
        m.brake_pedal_status = snapshot.brake_pedal_status;
        m.transmission_gear_position = snapshot.transmission_gear_position;
        m.odometer = snapshot.odometer;
        m.fuel_level = snapshot.fuel_level;
        m.fuel_consumed_since_restart = snapshot.fuel_consumed_since_restart;
        m.latitude = snapshot.location.latitude;
        m.longitude = snapshot.location.longitude;

        let speed = snapshot.vehicle_speed;
        if speed > HIGH_SPEED_KMH {
            m.high_speed_duration += elapsed;
        }
        if snapshot.ignition_status == IgnitionStatus::Run && speed <= IDLE_SPEED_KMH {
            m.idle_duration += elapsed;
        }

        let window_ms = now_ms.saturating_sub(self.accel_last_ms);
        if window_ms >= ACCEL_WINDOW_MS {
            let accel = (speed - self.accel_start_speed) / (window_ms as f64 / 1_000.0);
            if accel >= HIGH_ACCELERATION {
                m.high_acceleration_event += 1;
            }
            if snapshot.brake > 0.0 && accel < HIGH_BRAKING {
                m.high_braking_event += 1;
            }
            self.accel_start_speed = speed;
            self.accel_last_ms = now_ms;
        }

        if snapshot.ignition_status == IgnitionStatus::Off
            && self.last_ignition != Some(IgnitionStatus::Off)
        {
            m.end_time = Some(unix_ms);
        }
        self.last_ignition = Some(snapshot.ignition_status);
        self.last_ms = now_ms;
    }
}
