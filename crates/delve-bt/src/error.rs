use delve_core::CoreError;
use thiserror::Error;

/// Malformed-tree errors. These halt the owning agent's behavior, never the simulation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BtError {
    #[error("{node} requires at least one child")]
    EmptyComposite { node: &'static str },

    #[error("repeat limit must be at least 1")]
    ZeroRepeat,

    #[error(transparent)]
    Core(#[from] CoreError),
}
