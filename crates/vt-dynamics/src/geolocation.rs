//! Position, leg bearing, and steering-derived heading.

use std::f64::consts::{FRAC_PI_2, TAU};

use vt_core::{GeoPoint, RandomSource};

use crate::{Calculator, Snapshot, StepContext};

// ── Location ──────────────────────────────────────────────────────────────────

/// Distance moved toward the current leg's endpoint each tick, metres.
///
/// The reported position creeps along the leg and snaps to the next leg's
/// start on every stage change.  Stage completion is decided by the odometer,
/// not by reaching the endpoint.
pub const LOCATION_STEP_M: f64 = 0.001;

/// Great-circle step interpolation toward the active stage's endpoint.
#[derive(Clone, Debug)]
pub struct LocationCalc {
    position:    GeoPoint,
    stage_index: usize,
}

impl LocationCalc {
    pub fn new(start: GeoPoint) -> Self {
        Self { position: start, stage_index: 0 }
    }
}

impl Calculator for LocationCalc {
    type Output = GeoPoint;

    fn name(&self) -> &'static str {
        "location"
    }

    fn value(&self) -> GeoPoint {
        self.position
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        self.position = previous.location.point();

        let index = previous.current_route_stage;
        let Some(stage) = ctx.route.stage(index) else {
            // Burndown or ended: hold position.
            return;
        };
        if index != self.stage_index {
            self.stage_index = index;
            self.position = stage.start;
        }
        let bearing = self.position.bearing_to(stage.end);
        self.position = self.position.destination(LOCATION_STEP_M, bearing);
    }

    fn publish(&self, next: &mut Snapshot) {
        next.location.set_point(self.position);
    }
}

// ── Bearing ───────────────────────────────────────────────────────────────────

/// Initial great-circle bearing of the active stage, start to end.  Static
/// for the whole leg.
#[derive(Clone, Debug, Default)]
pub struct BearingCalc {
    bearing: f64,
}

impl BearingCalc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Calculator for BearingCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "bearing"
    }

    fn value(&self) -> f64 {
        self.bearing
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        if let Some(stage) = ctx.route.stage(previous.current_route_stage) {
            self.bearing = stage.bearing();
        }
    }

    fn publish(&self, next: &mut Snapshot) {
        next.location.bearing = self.bearing;
    }
}

// ── Heading ───────────────────────────────────────────────────────────────────

/// Steering wheel to road wheel ratio.
const STEERING_RATIO: f64 = 13.33;
/// Scales `tan` of the wheel angle into a turning circumference, km.
const TURNING_SCALE_KM: f64 = 0.028;

/// Heading accumulated from steering angle and distance travelled.
///
/// A straight wheel gives a turning circumference near `tan(π/2)`, so the
/// per-tick delta is vanishingly small rather than exactly zero.
#[derive(Clone, Debug, Default)]
pub struct HeadingCalc {
    radians: f64,
}

impl HeadingCalc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known heading, degrees.
    pub fn starting_at(degrees: f64) -> Self {
        Self { radians: degrees.to_radians().rem_euclid(TAU) }
    }
}

impl Calculator for HeadingCalc {
    type Output = f64;

    fn name(&self) -> &'static str {
        "heading"
    }

    /// Degrees in `[0, 360)`.
    fn value(&self) -> f64 {
        let degrees = self.radians.to_degrees();
        if degrees >= 360.0 { 0.0 } else { degrees }
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, _rng: &mut dyn RandomSource) {
        let wheel_deg = previous.steering_wheel_angle / STEERING_RATIO;
        let mut calc_angle = -wheel_deg.to_radians();
        if wheel_deg < 0.0 {
            calc_angle -= FRAC_PI_2;
        } else {
            calc_angle += FRAC_PI_2;
        }
        let turning_circumference_km = TURNING_SCALE_KM * calc_angle.tan();
        let distance_km = ctx.dt_secs * previous.vehicle_speed / 3_600.0;
        let delta = distance_km / turning_circumference_km * TAU;
        if delta.is_finite() {
            let heading = (self.radians + delta).rem_euclid(TAU);
            self.radians = if heading >= TAU { 0.0 } else { heading };
        }
    }

    fn publish(&self, next: &mut Snapshot) {
        next.heading = self.value();
    }
}
