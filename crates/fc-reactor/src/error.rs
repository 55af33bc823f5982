//! Error types for reactor model construction.

use thiserror::Error;

/// Errors raised while building a reactor model. Stepping never fails.
#[derive(Error, Debug)]
pub enum ReactorError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-finite parameter {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}

pub type ReactorResult<T> = Result<T, ReactorError>;

impl From<fc_core::CoreError> for ReactorError {
    fn from(e: fc_core::CoreError) -> Self {
        match e {
            fc_core::CoreError::NonFinite { what, value } => ReactorError::NonFinite { what, value },
            fc_core::CoreError::InvalidArg { what } => ReactorError::InvalidArg { what },
            fc_core::CoreError::Spawn { .. } => ReactorError::InvalidArg {
                what: "unexpected worker error in reactor setup",
            },
        }
    }
}
