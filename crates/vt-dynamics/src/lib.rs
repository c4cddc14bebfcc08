//! `vt-dynamics` — the per-tick vehicle model.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                     |
//! |-----------------|--------------------------------------------------------------|
//! | [`snapshot`]    | `Snapshot`, `Location`, `SnapshotError`                      |
//! | [`calculator`]  | `Calculator` trait, object-safe `PipelineStep`, `StepContext`|
//! | [`kinematics`]  | speed, acceleration, gear, engine speed, torque              |
//! | [`consumption`] | fuel consumed, odometer, fuel level, fuel spent              |
//! | [`thermal`]     | oil temperature                                              |
//! | [`geolocation`] | location, bearing, heading                                   |
//! | [`progression`] | `RouteProgression` state machine, `RouteState`               |
//!
//! # One-tick lag
//!
//! Each tick the orchestrator clones the previous snapshot into a new one.
//! Every calculator reads **only** the previous snapshot and writes its
//! output into the new one.  Quantities that depend on each other (speed and
//! engine speed, speed and gear) therefore see the other's value from the
//! prior tick, which makes the cyclic dependency graph well defined without a
//! simultaneous solve.

pub mod calculator;
pub mod consumption;
pub mod geolocation;
pub mod kinematics;
pub mod progression;
pub mod snapshot;
pub mod thermal;


pub use calculator::{Calculator, PipelineStep, StepContext};
pub use consumption::{FuelConsumedCalc, FuelLevelCalc, FuelSpentCalc, OdometerCalc};
pub use geolocation::{BearingCalc, HeadingCalc, LocationCalc};
pub use kinematics::{AccelerationCalc, EngineSpeedCalc, GearCalc, SpeedCalc, TorqueCalc};
pub use progression::{RouteProgression, RouteState, StageProgress};
pub use snapshot::{Location, Snapshot, SnapshotError};
pub use thermal::OilTempCalc;
