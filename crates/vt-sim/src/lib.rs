//! `vt-sim` — per-vehicle orchestrator for the rust_vt telemetry simulator.
//!
//! # Tick loop
//!
//! ```text
//! each tick (period = config.tick_period_ms of simulated time):
//!   ① Clock     — advance; Δt = tick period.
//!   ② Pipeline  — clone the previous snapshot; every calculator reads the
//!                 previous snapshot and writes into the clone, in
//!                 registration order.
//!   ③ Route     — RouteProgression runs last and merges throttle, brake,
//!                 stage, triggers and DTC.
//!   ④ Finish    — timestamp; on route end stop the clock and switch the
//!                 engine off.
//!   ⑤ Check     — invariant violation ⇒ stop, return InvalidSnapshot.
//!   ⑥ Aggregate — fold into AggregatedMetrics, mirror trip fields, retain.
//! ```
//!
//! # Crate layout
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`model`]      | `DynamicsModel`: lifecycle, tick, accessors            |
//! | [`builder`]    | `ModelBuilder`: validation and default pipeline        |
//! | [`params`]     | `ModelParams` initialization input                     |
//! | [`aggregator`] | `Aggregator`, `AggregatedMetrics`, `RunningMean`       |
//! | [`observer`]   | `TelemetryObserver` hooks, `NoopObserver`              |
//! | [`fleet`]      | `run_fleet`, `run_fleet_with`                          |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Fleet runs use Rayon's thread pool.                      |
//! | `serde`    | `Serialize`/`Deserialize` on params, metrics, snapshots. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use vt_core::SimConfig;
//! use vt_route::load_route_json;
//! use vt_sim::{ModelBuilder, ModelParams, NoopObserver};
//!
//! let route = load_route_json("routes/commute.json".as_ref())?;
//! let mut model = ModelBuilder::new(SimConfig::default(), ModelParams::new("VIN123").with_route(route))
//!     .build()?;
//! model.run(&mut NoopObserver)?;
//! println!("{:?}", model.aggregated_metrics());
//! ```

pub mod aggregator;
pub mod builder;
pub mod error;
pub mod fleet;
pub mod model;
pub mod observer;
pub mod params;

#[cfg(test)]
mod tests;

pub use aggregator::{AggregatedMetrics, Aggregator, RunningMean};
pub use builder::ModelBuilder;
pub use error::{SimError, SimResult};
pub use fleet::{run_fleet, run_fleet_with};
pub use model::DynamicsModel;
pub use observer::{NoopObserver, TelemetryObserver};
pub use params::{DEFAULT_FUEL_TANK_CAPACITY, ModelParams};
