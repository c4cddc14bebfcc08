//! `vt-route` — planned routes, stages, fault triggers, and route loading.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                       |
//! |--------------|----------------------------------------------------------------|
//! | [`route`]    | `Profile`, `RouteStage`, `Route` (+ `from_waypoints`)          |
//! | [`trigger`]  | `TriggerKind`, `TriggerTemplate`, `Trigger`, `plan_triggers`   |
//! | [`dtc`]      | static diagnostic trouble code table, `random_dtc`             |
//! | [`loader`]   | `load_route_json`, `load_route_reader`, `parse_route`          |
//! | [`error`]    | `RouteError`, `RouteResult<T>`                                 |
//!
//! # Route document
//!
//! Routes use the simulator's JSON document.  Coordinates are GeoJSON-style
//! `[lon, lat]` pairs:
//!
//! ```json
//! {
//!   "route_id": "r1",
//!   "profile": "aggressive",
//!   "km": 10.0,
//!   "stages": [
//!     { "stage": 0, "start": [-122.33, 47.60], "end": [-122.30, 47.62], "km": 5.0 },
//!     { "stage": 1, "start": [-122.30, 47.62], "end": [-122.28, 47.65], "km": 5.0 }
//!   ],
//!   "triggers": [ { "type": "dtc", "occurances": 1 } ]
//! }
//! ```
//!
//! A `Route` is immutable once loaded.  Per-trip runtime state (stage entry
//! odometer, stage start time, fired flags) lives in the route state machine,
//! not here.

pub mod dtc;
pub mod error;
pub mod loader;
pub mod route;
pub mod trigger;


pub use dtc::{DIAGNOSTIC_TROUBLE_CODES, random_dtc};
pub use error::{RouteError, RouteResult};
pub use loader::{load_route_json, load_route_reader, parse_route};
pub use route::{Profile, Route, RouteStage};
pub use trigger::{Trigger, TriggerKind, TriggerTemplate, plan_triggers};
