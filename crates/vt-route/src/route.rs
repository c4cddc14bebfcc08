//! Route and stage definitions.
//!
//! A route is an ordered list of straight great-circle legs ("stages").  The
//! vehicle drives each leg until the odometer has covered its length, then
//! moves on; after the last leg it enters burndown and stops.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use vt_core::GeoPoint;

use crate::trigger::{Trigger, TriggerTemplate};
use crate::{RouteError, RouteResult};

// ── Profile ───────────────────────────────────────────────────────────────────

/// Driving style.  Selects the start-throttle range and the weighted throttle
/// delta table used by the route state machine.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Profile {
    #[default]
    Normal,
    Aggressive,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Normal     => "normal",
            Profile::Aggressive => "aggressive",
        }
    }
}

/// Anything other than `"aggressive"` drives normally.
impl From<String> for Profile {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("aggressive") {
            Profile::Aggressive
        } else {
            Profile::Normal
        }
    }
}

impl From<Profile> for &'static str {
    fn from(p: Profile) -> &'static str {
        p.as_str()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── RouteStage ────────────────────────────────────────────────────────────────

/// One leg of a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteStage {
    #[serde(rename = "stage", default)]
    pub index: usize,

    #[serde(with = "lon_lat")]
    pub start: GeoPoint,

    #[serde(with = "lon_lat")]
    pub end: GeoPoint,

    /// Leg length in kilometres.
    pub km: f64,

    /// Trigger records surfaced when the vehicle enters this stage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
}

impl RouteStage {
    pub fn new(index: usize, start: GeoPoint, end: GeoPoint, km: f64) -> Self {
        Self { index, start, end, km, triggers: Vec::new() }
    }

    /// Initial great-circle bearing of this leg, degrees in `[0, 360)`.
    #[inline]
    pub fn bearing(&self) -> f64 {
        self.start.bearing_to(self.end)
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// A planned multi-stage route.  Immutable once built; shared by reference
/// between the model and any collaborator that asks for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub route_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub profile: Profile,

    /// Total length in kilometres.  Upper bound for trigger target distances.
    pub km: f64,

    pub stages: Vec<RouteStage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<TriggerTemplate>,
}

impl Route {
    /// Build a route from its stages, summing `km` from the stage lengths.
    pub fn new(route_id: impl Into<String>, profile: Profile, stages: Vec<RouteStage>) -> Self {
        let km = stages.iter().map(|s| s.km).sum();
        Self {
            route_id: route_id.into(),
            description: String::new(),
            profile,
            km,
            stages,
            triggers: Vec::new(),
        }
    }

    /// Pack consecutive waypoints into stages, each measured with the
    /// haversine distance.
    pub fn from_waypoints(
        route_id: impl Into<String>,
        profile: Profile,
        waypoints: &[GeoPoint],
    ) -> RouteResult<Self> {
        if waypoints.len() < 2 {
            return Err(RouteError::TooFewWaypoints(waypoints.len()));
        }
        let stages = waypoints
            .windows(2)
            .enumerate()
            .map(|(i, pair)| RouteStage::new(i, pair[0], pair[1], pair[0].distance_m(pair[1]) / 1000.0))
            .collect();
        let route = Route::new(route_id, profile, stages);
        route.validate()?;
        Ok(route)
    }

    /// Builder-style trigger template registration.
    pub fn with_trigger(mut self, template: TriggerTemplate) -> Self {
        self.triggers.push(template);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Reject routes the state machine cannot drive.
    pub fn validate(&self) -> RouteResult<()> {
        if self.stages.is_empty() {
            return Err(RouteError::Empty);
        }
        for (index, stage) in self.stages.iter().enumerate() {
            if !stage.km.is_finite() || stage.km < 0.0 {
                return Err(RouteError::InvalidStage {
                    index,
                    reason: format!("length {} km is not a finite non-negative number", stage.km),
                });
            }
            if !stage.start.is_finite() || !stage.end.is_finite() {
                return Err(RouteError::InvalidStage {
                    index,
                    reason: "coordinates must be finite".into(),
                });
            }
        }
        if !self.km.is_finite() || self.km < 0.0 {
            return Err(RouteError::Parse(format!("route length {} km is invalid", self.km)));
        }
        Ok(())
    }

    #[inline]
    pub fn stage(&self, index: usize) -> Option<&RouteStage> {
        self.stages.get(index)
    }

    #[inline]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// First coordinate of the route, `None` for an empty route.
    pub fn start(&self) -> Option<GeoPoint> {
        self.stages.first().map(|s| s.start)
    }

    /// Last coordinate of the route, `None` for an empty route.
    pub fn end(&self) -> Option<GeoPoint> {
        self.stages.last().map(|s| s.end)
    }
}

// ── [lon, lat] coordinate encoding ────────────────────────────────────────────

mod lon_lat {
    use super::*;

    pub fn serialize<S: Serializer>(p: &GeoPoint, s: S) -> Result<S::Ok, S::Error> {
        p.to_lon_lat().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<GeoPoint, D::Error> {
        <[f64; 2]>::deserialize(d).map(GeoPoint::from_lon_lat)
    }
}
