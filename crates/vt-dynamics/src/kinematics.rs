//! Longitudinal dynamics: speed, reported acceleration, automatic gear,
//! engine speed, and torque at the transmission.
//!
//! Speed and engine speed feed each other (engine drag slows the car, the
//! car's speed sets the engine speed).  Both read the other's value from the
//! previous tick.

use vt_core::{Gear, RandomSource};

use crate::{Calculator, Snapshot, StepContext};

// ── Speed ─────────────────────────────────────────────────────────────────────

const AIR_DRAG_COEFFICIENT: f64 = 8e-6;
const ENGINE_DRAG_COEFFICIENT: f64 = 4e-4;
const BRAKE_CONSTANT: f64 = 0.1;
const ROLLING_RESISTANCE: f64 = 0.1;
/// Engine force at full throttle in first gear, km/h per second.
const ENGINE_V0_FORCE: f64 = 30.0;

/// Vehicle speed in km/h from a simple force balance.
///
/// ```text
/// a = engine_force - speed³·8e-6 - rpm·4e-4 - 0.1 - brake·0.1  [- 10 if parked]
/// engine_force = 30·accel% / (50·gear)   (engine running, gear > neutral)
/// speed' = max(speed + a·Δt, 0)
/// ```
#[derive(Clone, Debug, Default)]
pub struct SpeedCalc {
    speed: f64,
}

impl SpeedCalc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Calculator for SpeedCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "vehicle_speed"
    }

    fn value(&self) -> f64 {
        self.speed
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        let speed = previous.vehicle_speed;
        let gear = previous.transmission_gear_position;

        let air_drag = speed * speed * speed * AIR_DRAG_COEFFICIENT;
        let engine_drag = previous.engine_speed * ENGINE_DRAG_COEFFICIENT;
        let engine_force = if previous.engine_running && !gear.is_neutral() {
            ENGINE_V0_FORCE * previous.accelerator_pedal_position / (50.0 * gear.number() as f64)
        } else {
            0.0
        };

        let mut accel = engine_force
            - air_drag
            - engine_drag
            - ROLLING_RESISTANCE
            - previous.brake * BRAKE_CONSTANT;
        if previous.parking_brake_status {
            accel -= BRAKE_CONSTANT * 100.0;
        }

        self.speed = (speed + accel * ctx.dt_secs).max(0.0);
    }

    fn publish(&self, next: &mut Snapshot) {
        next.vehicle_speed = self.speed;
    }
}

// ── Acceleration ──────────────────────────────────────────────────────────────

const ACCEL_WINDOW_MS: u64 = 1_000;

/// Reported acceleration, km/h per second, sampled once per ≥ 1 s window.
#[derive(Clone, Debug, Default)]
pub struct AccelerationCalc {
    accel:       f64,
    start_speed: f64,
    last_ms:     u64,
}

impl AccelerationCalc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Calculator for AccelerationCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "acceleration"
    }

    fn value(&self) -> f64 {
        self.accel
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        if ctx.now_ms.saturating_sub(self.last_ms) >= ACCEL_WINDOW_MS {
            // Speed difference over a nominal one-second window.
            self.accel = previous.vehicle_speed - self.start_speed;
            self.start_speed = previous.vehicle_speed;
            self.last_ms = ctx.now_ms;
        }
    }

    fn publish(&self, next: &mut Snapshot) {
        next.acceleration = self.accel;
    }
}

// ── Gear ──────────────────────────────────────────────────────────────────────

/// `[low, high]` km/h band per gear, indexed by gear number.
pub const GEAR_SPEED_BANDS: [[f64; 2]; 7] = [
    [0.0,   0.0],
    [0.0,   25.0],
    [20.0,  50.0],
    [45.0,  75.0],
    [70.0,  100.0],
    [95.0,  125.0],
    [120.0, 500.0],
];

/// Automatic transmission.  Shifts one gear per tick when speed leaves the
/// current gear's band.  Holds position with the engine off or in manual mode.
#[derive(Clone, Debug)]
pub struct GearCalc {
    gear: Gear,
}

impl GearCalc {
    pub fn new(initial: Gear) -> Self {
        Self { gear: initial }
    }
}

impl Default for GearCalc {
    fn default() -> Self {
        Self::new(Gear::First)
    }
}

impl Calculator for GearCalc {
    type Output = Gear;

    fn name(&self) -> &'static str {
        "transmission_gear_position"
    }

    fn value(&self) -> Gear {
        self.gear
    }

    fn iterate(&mut self, previous: &Snapshot, _ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        let gear = previous.transmission_gear_position;
        self.gear = gear;
        if !previous.engine_running || previous.manual_trans {
            return;
        }
        let [low, high] = GEAR_SPEED_BANDS[gear.number() as usize];
        let speed = previous.vehicle_speed;
        if speed < low {
            self.gear = gear.down();
        } else if speed > high {
            self.gear = gear.up();
        }
    }

    fn publish(&self, next: &mut Snapshot) {
        next.transmission_gear_position = self.gear;
    }
}

// ── Engine speed ──────────────────────────────────────────────────────────────

pub const IDLE_ENGINE_SPEED: f64 = 2_000.0;
const ENGINE_SPEED_FACTOR: f64 = 16_382.0;

/// Engine RPM.  Fixed idle in neutral, otherwise proportional to road speed
/// over gear.
#[derive(Clone, Debug, Default)]
pub struct EngineSpeedCalc {
    rpm: f64,
}

impl EngineSpeedCalc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Calculator for EngineSpeedCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "engine_speed"
    }

    fn value(&self) -> f64 {
        self.rpm
    }

    fn iterate(&mut self, previous: &Snapshot, _ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        let gear = previous.transmission_gear_position;
        self.rpm = if gear.is_neutral() {
            IDLE_ENGINE_SPEED
        } else {
            ENGINE_SPEED_FACTOR * previous.vehicle_speed / (100.0 * gear.number() as f64)
        };
    }

    fn publish(&self, next: &mut Snapshot) {
        next.engine_speed = self.rpm;
    }
}

// ── Torque ────────────────────────────────────────────────────────────────────

const ENGINE_TO_TORQUE: f64 = 500.0 / ENGINE_SPEED_FACTOR;

/// Torque at the transmission: throttle power scaled down 10 % per gear above
/// first, minus engine drag.
#[derive(Clone, Debug, Default)]
pub struct TorqueCalc {
    torque: f64,
}

impl TorqueCalc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Calculator for TorqueCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "torque_at_transmission"
    }

    fn value(&self) -> f64 {
        self.torque
    }

    fn iterate(&mut self, previous: &Snapshot, _ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        let above_first = previous.transmission_gear_position.number().saturating_sub(1);
        let gear_ratio = 1.0 - above_first as f64 * 0.1;
        let drag = previous.engine_speed * ENGINE_TO_TORQUE;
        self.torque = if previous.engine_running {
            previous.accelerator_pedal_position * 15.0 * gear_ratio - drag
        } else {
            -drag
        };
    }

    fn publish(&self, next: &mut Snapshot) {
        next.torque_at_transmission = self.torque;
    }
}
