//! Route progression — the driver.
//!
//! # State machine
//!
//! ```text
//!   Stage(0) ──odometer ≥ start+km──▶ Stage(1) ─ … ─▶ Stage(N-1)
//!                                                        │ odometer ≥ start+km
//!                                                        ▼
//!                                 Ended ◀──20 s── Burndown (throttle 0, brake 100)
//! ```
//!
//! While driving a stage the progression:
//!
//! - re-commits the throttle every 30–60 s by a profile-weighted random delta,
//!   releasing the brake;
//! - fires each planned trigger once, the first tick the trip odometer reaches
//!   its target;
//! - nudges the throttle within ±4 of the committed value every 7 s, unless
//!   the pedal is at 0 or 100 or the brake is applied.
//!
//! All timers run on simulated milliseconds from [`StepContext::now_ms`].

use log::debug;

use vt_core::{GeoPoint, RandomSource};
use vt_route::{Profile, Route, Trigger, TriggerKind, plan_triggers, random_dtc};

use crate::{Calculator, Snapshot, StepContext};

// ── Constants ─────────────────────────────────────────────────────────────────

pub const JITTER_PERIOD_MS: u64 = 7_000;
pub const THROTTLE_JITTER: f64 = 4.0;
pub const BURNDOWN_MS: u64 = 20_000;

const THROTTLE_ADJUST_MIN_MS: f64 = 30_000.0;
const THROTTLE_ADJUST_MAX_MS: f64 = 60_000.0;
const FULL_BRAKE: f64 = 100.0;

/// Throttle deltas for the normal profile, weighted by repetition.
const NORMAL_DELTAS: [f64; 45] = [
    2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0,
    25.0,
    5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0,
    7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0,
    8.0, 8.0, 8.0, 8.0, 8.0, 8.0, 8.0, 8.0, 8.0, 8.0,
    15.0, 15.0, 15.0, 15.0,
    20.0, 20.0,
];

/// Throttle deltas for the aggressive profile, weighted by repetition.
const AGGRESSIVE_DELTAS: [f64; 42] = [
    10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0,
    12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0,
    15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0,
    20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0,
    25.0, 25.0, 25.0, 25.0,
];

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RouteState {
    Stage(usize),
    Burndown { since_ms: u64 },
    Ended,
}

/// Runtime fields of a stage, set when it becomes active.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StageProgress {
    /// Cumulative odometer at stage entry, km.
    pub odometer_start: f64,
    pub started_at_ms:  u64,
}

/// The route state machine.
///
/// Registered as a dedicated handle on the model and run after every other
/// calculator; its [`publish`][Calculator::publish] merges throttle, brake,
/// triggers, DTC, stage and trip odometer into the new snapshot.
#[derive(Clone, Debug)]
pub struct RouteProgression {
    state:    RouteState,
    progress: Vec<Option<StageProgress>>,

    planned:          Vec<Trigger>,
    surfaced:         Vec<Trigger>,
    triggers_changed: bool,
    dtc_code:         Option<String>,

    committed_throttle: f64,
    throttle:           f64,
    brake:              f64,
    adjust_period_ms:   u64,
    last_adjust_ms:     u64,
    last_jitter_ms:     u64,

    initial_odometer:  f64,
    trip_odometer:     f64,
    route_duration_ms: Option<u64>,
    final_point:       Option<GeoPoint>,
}

impl RouteProgression {
    /// Plan a trip over `route`.
    ///
    /// Draws, in order: the first throttle adjustment period, every trigger
    /// target distance, and the starting throttle.
    pub fn new(route: &Route, initial_odometer: f64, rng: &mut dyn RandomSource) -> Self {
        let adjust_period_ms = throttle_adjust_period(rng);
        let planned = plan_triggers(&route.triggers, route.km, rng);
        let committed = start_throttle(route.profile, rng);

        let mut progress = vec![None; route.stage_count()];
        if let Some(first) = progress.first_mut() {
            *first = Some(StageProgress { odometer_start: initial_odometer, started_at_ms: 0 });
        }

        debug!(
            "route {}: planned {} triggers, start throttle {:.1}, first adjustment in {} ms",
            route.route_id,
            planned.len(),
            committed,
            adjust_period_ms,
        );

        Self {
            state: RouteState::Stage(0),
            progress,
            planned,
            surfaced: Vec::new(),
            triggers_changed: false,
            dtc_code: None,
            committed_throttle: committed,
            throttle: committed,
            brake: 0.0,
            adjust_period_ms,
            last_adjust_ms: 0,
            last_jitter_ms: 0,
            initial_odometer,
            trip_odometer: 0.0,
            route_duration_ms: None,
            final_point: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> RouteState {
        self.state
    }

    /// Active stage index.  Equals the stage count once past the last stage.
    pub fn current_stage(&self) -> usize {
        match self.state {
            RouteState::Stage(index) => index,
            _ => self.progress.len(),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.state == RouteState::Ended
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn committed_throttle(&self) -> f64 {
        self.committed_throttle
    }

    pub fn brake(&self) -> f64 {
        self.brake
    }

    /// The armed/fired triggers planned for this trip.
    pub fn planned_triggers(&self) -> &[Trigger] {
        &self.planned
    }

    /// Trigger records currently surfaced on the snapshot.
    pub fn surfaced_triggers(&self) -> &[Trigger] {
        &self.surfaced
    }

    pub fn triggers_changed(&self) -> bool {
        self.triggers_changed
    }

    pub fn dtc_code(&self) -> Option<&str> {
        self.dtc_code.as_deref()
    }

    pub fn trip_odometer(&self) -> f64 {
        self.trip_odometer
    }

    pub fn route_duration_ms(&self) -> Option<u64> {
        self.route_duration_ms
    }

    pub fn stage_progress(&self, index: usize) -> Option<StageProgress> {
        self.progress.get(index).copied().flatten()
    }

    // ── Transitions ───────────────────────────────────────────────────────

    fn drive_stage(
        &mut self,
        index:    usize,
        odometer: f64,
        ctx:      &StepContext<'_>,
        rng:      &mut dyn RandomSource,
    ) {
        let stage_km = ctx.route.stage(index).map_or(0.0, |s| s.km);
        let odometer_start = self
            .stage_progress(index)
            .map_or(self.initial_odometer, |p| p.odometer_start);
        let move_stage = odometer_start + stage_km <= odometer;

        if ctx.now_ms.saturating_sub(self.last_adjust_ms) >= self.adjust_period_ms {
            let mut committed = self.committed_throttle + throttle_delta(ctx.route.profile, rng);
            if committed >= 100.0 {
                committed = 99.0;
            }
            if committed < 0.0 {
                committed = 5.0;
            }
            self.committed_throttle = committed;
            self.throttle = committed;
            self.brake = 0.0;
            self.adjust_period_ms = throttle_adjust_period(rng);
            self.last_adjust_ms = ctx.now_ms;
        }

        self.fire_due_triggers(odometer, rng);

        if move_stage {
            self.enter_stage(index + 1, odometer, ctx);
        }
    }

    fn fire_due_triggers(&mut self, odometer: f64, rng: &mut dyn RandomSource) {
        for trigger in self.planned.iter_mut().filter(|t| t.is_due(odometer)) {
            trigger.fire();
            match trigger.kind {
                TriggerKind::Brake => {
                    self.throttle = 0.0;
                    self.brake = FULL_BRAKE;
                }
                TriggerKind::Dtc => {
                    let code = random_dtc(rng).to_owned();
                    self.surfaced.push(Trigger::fired_record(TriggerKind::Dtc, Some(code.clone())));
                    self.dtc_code = Some(code);
                    self.triggers_changed = true;
                }
                TriggerKind::OilTemp => {
                    self.surfaced.push(Trigger::fired_record(TriggerKind::OilTemp, None));
                    self.triggers_changed = true;
                }
            }
            debug!("{} trigger fired at {:.2} km", trigger.kind, odometer);
        }
    }

    fn enter_stage(&mut self, index: usize, odometer: f64, ctx: &StepContext<'_>) {
        match ctx.route.stage(index) {
            Some(stage) => {
                self.state = RouteState::Stage(index);
                if let Some(slot) = self.progress.get_mut(index) {
                    *slot = Some(StageProgress { odometer_start: odometer, started_at_ms: ctx.now_ms });
                }
                if !stage.triggers.is_empty() {
                    self.surfaced = stage.triggers.clone();
                    self.triggers_changed = true;
                }
                debug!("entered stage {} at {:.3} km", index, odometer);
            }
            None => {
                self.state = RouteState::Burndown { since_ms: ctx.now_ms };
                self.throttle = 0.0;
                self.brake = FULL_BRAKE;
                debug!("route complete at {:.3} km, burning down", odometer);
            }
        }
    }

    fn finish(&mut self, ctx: &StepContext<'_>) {
        let started_at = self.stage_progress(0).map_or(0, |p| p.started_at_ms);
        self.state = RouteState::Ended;
        self.route_duration_ms = Some(ctx.now_ms.saturating_sub(started_at));
        self.committed_throttle = 0.0;
        self.throttle = 0.0;
        self.brake = 0.0;
        self.final_point = ctx.route.end();
        debug!("route ended after {} ms", ctx.now_ms.saturating_sub(started_at));
    }

    fn jitter(&mut self, ctx: &StepContext<'_>, rng: &mut dyn RandomSource) {
        if ctx.now_ms.saturating_sub(self.last_jitter_ms) < JITTER_PERIOD_MS {
            return;
        }
        if self.throttle != 0.0 && self.throttle != 100.0 && self.brake == 0.0 {
            self.throttle = jitter_position(self.committed_throttle, rng);
        }
        self.last_jitter_ms = ctx.now_ms;
    }
}

impl Calculator for RouteProgression {
    type Output = RouteState;

    fn name(&self) -> &'static str {
        "route_stage"
    }

    fn value(&self) -> RouteState {
        self.state
    }

    fn iterate(&mut self, previous: &Snapshot, ctx: &StepContext<'_>, rng: &mut dyn RandomSource) {
        let odometer = previous.odometer;
        self.triggers_changed = false;
        self.trip_odometer = odometer - self.initial_odometer;

        match self.state {
            RouteState::Ended => return,
            RouteState::Stage(index) => self.drive_stage(index, odometer, ctx, rng),
            RouteState::Burndown { since_ms } => {
                self.throttle = 0.0;
                self.brake = FULL_BRAKE;
                if ctx.now_ms.saturating_sub(since_ms) >= BURNDOWN_MS {
                    self.finish(ctx);
                }
            }
        }

        if !self.is_ended() {
            self.jitter(ctx, rng);
        }
    }

    /// Expects `next` to start as a copy of the previous snapshot: the DTC
    /// change flag compares against the code already there.
    fn publish(&self, next: &mut Snapshot) {
        next.accelerator_pedal_position = self.throttle;
        next.brake = self.brake;
        next.brake_pedal_status = self.brake > 0.0;
        next.triggers_changed = self.triggers_changed;
        next.current_route_stage = self.current_stage();
        next.trip_odometer = self.trip_odometer;

        if self.is_ended() {
            next.route_ended = true;
            next.route_duration_ms = self.route_duration_ms;
            if let Some(end) = self.final_point {
                next.location.set_point(end);
            }
        }

        let previous_code = next.dtc_code.take();
        next.dtc_code = self.dtc_code.clone().or_else(|| previous_code.clone());
        next.dtc_changed = next.dtc_code != previous_code;

        if self.triggers_changed {
            next.triggers = self.surfaced.clone();
        }
    }
}

// ── Random draws ──────────────────────────────────────────────────────────────

fn start_throttle(profile: Profile, rng: &mut dyn RandomSource) -> f64 {
    match profile {
        Profile::Normal     => rng.uniform(10.0, 40.0),
        Profile::Aggressive => rng.uniform(20.0, 50.0),
    }
}

fn throttle_adjust_period(rng: &mut dyn RandomSource) -> u64 {
    rng.uniform(THROTTLE_ADJUST_MIN_MS, THROTTLE_ADJUST_MAX_MS).floor() as u64
}

/// Signed delta: sign first (equal odds), then a weighted magnitude.
fn throttle_delta(profile: Profile, rng: &mut dyn RandomSource) -> f64 {
    let sign = if rng.coin() { -1.0 } else { 1.0 };
    let table: &[f64] = match profile {
        Profile::Normal     => &NORMAL_DELTAS,
        Profile::Aggressive => &AGGRESSIVE_DELTAS,
    };
    sign * table[rng.below(table.len())]
}

fn jitter_position(committed: f64, rng: &mut dyn RandomSource) -> f64 {
    let upper = (committed + THROTTLE_JITTER).min(100.0);
    let lower = if committed == 0.0 { 0.0 } else { (committed - THROTTLE_JITTER).max(0.0) };
    (rng.next_unit() * (upper - lower)).floor() + lower
}
