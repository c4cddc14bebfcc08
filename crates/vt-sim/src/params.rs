//! Model initialization parameters.

use vt_route::Route;

pub const DEFAULT_FUEL_TANK_CAPACITY: f64 = 40.0;

/// Everything a collaborator supplies to start one simulated vehicle.
///
/// With the `serde` feature this deserializes from the provisioning JSON
/// collaborators already produce; absent fields take their defaults.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModelParams {
    pub device_id: String,
    pub vin:       String,

    /// The route to drive.  May instead be supplied on the builder.
    pub route: Option<Route>,
    /// Opaque storage location the route was loaded from, for logs.
    pub route_location: Option<String>,

    /// Starting odometer, km.
    pub odometer: f64,
    /// Litres.  Default 40.
    pub fuel_tank_capacity: f64,

    /// Unix ms of tick 0.  Overrides `SimConfig::start_unix_ms` when set.
    pub start_time_ms: Option<i64>,

    /// Starting position.  Defaults to the first stage's start when either is
    /// absent.
    pub latitude:  Option<f64>,
    pub longitude: Option<f64>,

    pub simulation_id: String,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            device_id:          String::new(),
            vin:                String::new(),
            route:              None,
            route_location:     None,
            odometer:           0.0,
            fuel_tank_capacity: DEFAULT_FUEL_TANK_CAPACITY,
            start_time_ms:      None,
            latitude:           None,
            longitude:          None,
            simulation_id:      String::new(),
        }
    }
}

impl ModelParams {
    pub fn new(vin: impl Into<String>) -> Self {
        Self { vin: vin.into(), ..Self::default() }
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }
}
