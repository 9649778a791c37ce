use delve_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavError {
    #[error("invalid navigation config: {0}")]
    InvalidConfig(String),

    #[error("invalid voxel grid: {0}")]
    InvalidGrid(String),

    #[error("pathfinding service has shut down")]
    ServiceShutDown,

    #[error(transparent)]
    Core(#[from] CoreError),
}
