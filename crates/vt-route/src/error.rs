use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route parse error: {0}")]
    Parse(String),

    #[error("route JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("route has no stages")]
    Empty,

    #[error("stage {index} is invalid: {reason}")]
    InvalidStage { index: usize, reason: String },

    #[error("a route needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RouteResult<T> = Result<T, RouteError>;
