use thiserror::Error;

use vt_core::{Tick, VtError};
use vt_dynamics::SnapshotError;
use vt_route::RouteError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("model configuration error: {0}")]
    Config(String),

    #[error("no route supplied; a model needs a route to drive")]
    MissingRoute,

    #[error("route error: {0}")]
    Route(#[from] RouteError),

    #[error(transparent)]
    Core(#[from] VtError),

    #[error("tick {tick} produced an invalid snapshot: {reason}")]
    InvalidSnapshot { tick: Tick, reason: SnapshotError },
}

pub type SimResult<T> = Result<T, SimError>;
