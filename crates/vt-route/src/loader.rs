//! JSON route loader.
//!
//! Reads the route document described in the crate docs.  Unknown fields
//! (`name`, `start`, `end`, editor metadata) are ignored; the route's start and
//! end are always taken from its first and last stage.

use std::io::Read;
use std::path::Path;

use log::debug;

use crate::{Route, RouteResult};

/// Load and validate a route from a JSON file.
pub fn load_route_json(path: &Path) -> RouteResult<Route> {
    let file = std::fs::File::open(path)?;
    let route = load_route_reader(std::io::BufReader::new(file))?;
    debug!("loaded route {} from {}", route.route_id, path.display());
    Ok(route)
}

/// Like [`load_route_json`] but accepts any `Read` source.
pub fn load_route_reader<R: Read>(reader: R) -> RouteResult<Route> {
    let route: Route = serde_json::from_reader(reader)?;
    finish(route)
}

/// Parse a route from an in-memory JSON string.
pub fn parse_route(json: &str) -> RouteResult<Route> {
    let route: Route = serde_json::from_str(json)?;
    finish(route)
}

fn finish(mut route: Route) -> RouteResult<Route> {
    // Stage indices in route files are advisory; position is authoritative.
    for (i, stage) in route.stages.iter_mut().enumerate() {
        stage.index = i;
    }
    route.validate()?;
    debug!(
        "route {}: {} stages, {:.2} km, profile {}, {} trigger templates",
        route.route_id,
        route.stage_count(),
        route.km,
        route.profile,
        route.triggers.len(),
    );
    Ok(route)
}
