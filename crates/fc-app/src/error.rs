//! Error types for the orchestration layer.

use std::path::PathBuf;

/// Fatal errors: configuration, start-up wiring, log files.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to open data log: {path}")]
    LogOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Instrument error: {0}")]
    Instrument(#[from] fc_instruments::InstrumentError),

    #[error("Reactor model error: {0}")]
    Reactor(#[from] fc_reactor::ReactorError),

    #[error("Control error: {0}")]
    Control(#[from] fc_controls::ControlError),

    #[error(transparent)]
    Core(#[from] fc_core::CoreError),

    #[error("Sampling cycle is no longer available")]
    CycleUnavailable,
}

pub type AppResult<T> = Result<T, AppError>;

/// A failure inside one control tick. The sampling cycle logs it and moves on
/// to the next tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("no reading yet from {channel}")]
    MissingReading { channel: &'static str },

    #[error("non-finite {what}: {value}")]
    Numeric { what: &'static str, value: f64 },

    #[error("actuator command failed: {0}")]
    Actuator(#[from] fc_instruments::InstrumentError),

    #[error("failed to write control sample: {0}")]
    Log(#[from] std::io::Error),
}
