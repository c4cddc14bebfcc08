//! Scripted single-fire fault triggers.
//!
//! A route carries [`TriggerTemplate`]s (`{type, occurrences}`).  When a trip
//! starts, [`plan_triggers`] expands each template into `occurrences` armed
//! [`Trigger`]s, each with a random target distance along the route.  A
//! trigger fires on the first tick the trip odometer reaches its target, and
//! never again.
//!
//! | Kind      | Effect when fired                                            |
//! |-----------|--------------------------------------------------------------|
//! | `brake`   | throttle forced to 0, brake to 100                           |
//! | `dtc`     | random diagnostic code set, record appended                  |
//! | `oiltemp` | record appended; oil temperature steps to an overheat zone   |

use serde::{Deserialize, Serialize};

use vt_core::RandomSource;

/// Minimum target distance, km.  Nothing fires in the first 200 m.
pub const MIN_TRIGGER_KM: f64 = 0.2;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Brake,
    Dtc,
    #[serde(rename = "oiltemp")]
    OilTemp,
}

impl TriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::Brake   => "brake",
            TriggerKind::Dtc     => "dtc",
            TriggerKind::OilTemp => "oiltemp",
        }
    }
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many triggers of one kind to scatter over a route.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TriggerTemplate {
    #[serde(rename = "type")]
    pub kind: TriggerKind,

    /// Route documents in the wild spell this `occurances`.
    #[serde(alias = "occurances")]
    pub occurrences: u32,
}

impl TriggerTemplate {
    pub fn new(kind: TriggerKind, occurrences: u32) -> Self {
        Self { kind, occurrences }
    }
}

/// An armed or fired trigger.
///
/// Armed triggers carry a `target_km`; the records the state machine appends
/// when a trigger fires carry only the kind, the `fired` flag and, for DTCs,
/// the code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerKind,

    #[serde(rename = "km", default, skip_serializing_if = "Option::is_none")]
    pub target_km: Option<f64>,

    #[serde(alias = "triggered", default)]
    pub fired: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Trigger {
    pub fn armed(kind: TriggerKind, target_km: f64) -> Self {
        Self { kind, target_km: Some(target_km), fired: false, value: None }
    }

    /// The record appended to the surfaced trigger list when a trigger fires.
    pub fn fired_record(kind: TriggerKind, value: Option<String>) -> Self {
        Self { kind, target_km: None, fired: true, value }
    }

    /// `true` when this trigger is armed and `distance_km` has reached it.
    #[inline]
    pub fn is_due(&self, distance_km: f64) -> bool {
        !self.fired && self.target_km.is_some_and(|t| distance_km >= t)
    }

    /// Mark as fired.  Returns `false` if it had already fired.
    #[inline]
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }
}

/// Round to two decimal places (0.01 km resolution).
#[inline]
fn round2(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Expand trigger templates into armed triggers with random target
/// distances in `[0.2, route_km)`, in template order.
pub fn plan_triggers(
    templates: &[TriggerTemplate],
    route_km: f64,
    rng: &mut dyn RandomSource,
) -> Vec<Trigger> {
    let total = templates.iter().map(|t| t.occurrences as usize).sum();
    let mut planned = Vec::with_capacity(total);
    for template in templates {
        for _ in 0..template.occurrences {
            let target = round2(rng.uniform(MIN_TRIGGER_KM, route_km));
            planned.push(Trigger::armed(template.kind, target));
        }
    }
    planned
}
