//! Process orchestration for flowcascade.
//!
//! This crate wires the reactor model, the sensor filters and the instrument
//! adapters into the model-predictive diversion loop: configuration, the
//! phase sequence, the per-tick sampling cycle, and the data log.

pub mod config;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod phase;
pub mod sample;
pub mod sampling;
pub mod simulate;
pub mod wiring;

pub use config::{
    FlowControlConfig, FlowMeterConfig, InstrumentConfig, ProcessConfig, PumpConfig, RunConfig,
    WarmupConfig,
};
pub use error::{AppError, AppResult, TickError};
pub use logger::{CsvLogger, DataSink, SharedSink};
pub use orchestrator::{ProcessOrchestrator, RunOutcome};
pub use phase::ProcessPhase;
pub use sample::ControlSample;
pub use sampling::{CycleSettings, SamplingCycle};
pub use simulate::{SimulationInputs, simulate_cascade};
pub use wiring::{Actuators, Sensors, connect_hardware};
