//! Fixed-period loop configuration.
//!
//! Polling loops (warmup temperature checks, the control sampling cycle, the
//! run watchdog) sleep a constant period between iterations.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sample configuration for a fixed-period loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    /// Create a new sample configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `dt` is not a positive finite number.
    pub fn new(dt: f64) -> ControlResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { dt })
    }

    /// Sample frequency in Hz.
    pub fn frequency(&self) -> f64 {
        1.0 / self.dt
    }

    /// Period as a sleepable duration.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.dt).unwrap_or(Duration::MAX)
    }
}
