//! Fuel and distance integrators.

use vt_core::RandomSource;

use crate::{Calculator, Snapshot, StepContext};

// ── Fuel consumed ─────────────────────────────────────────────────────────────

/// Litres per second at full throttle.
const MAX_FUEL_RATE: f64 = 0.0015;
/// Litres added per tick while idling.
const IDLE_FUEL_RATE: f64 = 0.000015;

/// Cumulative litres burned since the engine was started.
#[derive(Clone, Debug, Default)]
pub struct FuelConsumedCalc {
    litres: f64,
}

impl FuelConsumedCalc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Calculator for FuelConsumedCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "fuel_consumed_since_restart"
    }

    fn value(&self) -> f64 {
        self.litres
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        if previous.engine_running {
            self.litres += IDLE_FUEL_RATE
                + MAX_FUEL_RATE * (previous.accelerator_pedal_position / 100.0) * ctx.dt_secs;
        }
    }

    fn publish(&self, next: &mut Snapshot) {
        next.fuel_consumed_since_restart = self.litres;
    }
}

// ── Odometer ──────────────────────────────────────────────────────────────────

/// Cumulative kilometres.  Integrates km/h over the tick.
#[derive(Clone, Debug, Default)]
pub struct OdometerCalc {
    km: f64,
}

impl OdometerCalc {
    pub fn new(initial_km: f64) -> Self {
        Self { km: initial_km }
    }
}

impl Calculator for OdometerCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "odometer"
    }

    fn value(&self) -> f64 {
        self.km
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        self.km += previous.vehicle_speed * ctx.dt_secs / 3_600.0;
    }

    fn publish(&self, next: &mut Snapshot) {
        next.odometer = self.km;
    }
}

// ── Fuel level ────────────────────────────────────────────────────────────────

/// Tank level, percent.  Drains by the fraction of tank capacity consumed.
#[derive(Clone, Debug)]
pub struct FuelLevelCalc {
    initial: f64,
    level:   f64,
}

impl FuelLevelCalc {
    pub fn new(initial_percent: f64) -> Self {
        let initial = initial_percent.clamp(0.0, 100.0);
        Self { initial, level: initial }
    }
}

impl Default for FuelLevelCalc {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Calculator for FuelLevelCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "fuel_level"
    }

    fn value(&self) -> f64 {
        self.level
    }

    fn iterate(&mut self, previous: &Snapshot, _ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        let capacity = previous.fuel_tank_capacity;
        if capacity <= 0.0 {
            return;
        }
        let used = previous.fuel_consumed_since_restart / capacity * 100.0;
        self.level = (self.initial - used).max(0.0);
    }

    fn publish(&self, next: &mut Snapshot) {
        next.fuel_level = self.level;
    }
}

// ── Fuel spent ────────────────────────────────────────────────────────────────

/// Millilitres missing from a full tank.  An empty reading reports `0`.
#[derive(Clone, Debug, Default)]
pub struct FuelSpentCalc {
    millilitres: f64,
}

impl FuelSpentCalc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Calculator for FuelSpentCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "fuel_spent"
    }

    fn value(&self) -> f64 {
        self.millilitres
    }

    fn iterate(&mut self, previous: &Snapshot, _ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        let capacity = previous.fuel_tank_capacity;
        let level = previous.fuel_level;
        self.millilitres = if level == 0.0 {
            0.0
        } else {
            (capacity - level / 100.0 * capacity) * 1_000.0
        };
    }

    fn publish(&self, next: &mut Snapshot) {
        next.fuel_spent = self.millilitres;
    }
}
