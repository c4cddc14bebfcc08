//! `vt-core` — foundational types for the `rust_vt` vehicle telemetry simulator.
//!
//! This crate is a dependency of every other `vt-*` crate.  It intentionally
//! has no `vt-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `VehicleId`, trip id generation                           |
//! | [`geo`]         | `GeoPoint`, haversine distance, bearing, destination      |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                           |
//! | [`rng`]         | `RandomSource` trait, `VehicleRng`, `SequenceRng`         |
//! | [`vehicle`]     | `Gear`, `IgnitionStatus`                                  |
//! | [`error`]       | `VtError`, `VtResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{VtError, VtResult};
pub use geo::GeoPoint;
pub use ids::{VehicleId, generate_trip_id};
pub use rng::{RandomSource, SequenceRng, VehicleRng};
pub use time::{SimClock, SimConfig, Tick};
pub use vehicle::{Gear, IgnitionStatus};
