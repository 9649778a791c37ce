use thiserror::Error;

/// Invariant violations raised by kernel primitives.
///
/// These are programming errors, not gameplay failures: gameplay failures travel as
/// [`crate::Status::Failure`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("blackboard type mismatch for key `{key}`: stored {stored}, requested {requested}")]
    BlackboardTypeMismatch {
        key: String,
        stored: &'static str,
        requested: &'static str,
    },

    #[error("invalid timer duration {0}")]
    InvalidDuration(String),
}
