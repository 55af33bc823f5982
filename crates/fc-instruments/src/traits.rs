//! Capability traits consumed by the control loop.
//!
//! Every method takes `&self`: adapters are shared between the orchestrator,
//! the sampling thread and instrument callbacks, so they synchronise
//! internally.

use crate::error::InstrumentResult;
use serde::{Deserialize, Serialize};

/// Callback invoked with every new sample, on the adapter's own thread.
pub type Subscriber = Box<dyn FnMut(f64) + Send>;

/// Closed interval a reading is expected to stay within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingRange {
    pub low: f64,
    pub high: f64,
}

impl OperatingRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// A streaming sensor.
pub trait Instrument: Send + Sync {
    fn name(&self) -> &str;

    /// Most recent reading, `None` before the first sample arrives.
    fn current_value(&self) -> Option<f64>;

    fn subscribe(&self, subscriber: Subscriber);

    fn operating_range(&self) -> Option<OperatingRange>;

    fn set_operating_range(&self, range: Option<OperatingRange>);

    /// `true` with no range configured; `false` if a range is set but no
    /// reading has arrived yet.
    fn is_within_range(&self) -> bool {
        match (self.operating_range(), self.current_value()) {
            (None, _) => true,
            (Some(range), Some(value)) => range.contains(value),
            (Some(_), None) => false,
        }
    }

    /// Ask the background reader to stop. Idempotent.
    fn close(&self);
}

/// Dosing pump driven by a speed in percent of full scale.
pub trait Pump: Send + Sync {
    fn name(&self) -> &str;

    /// Last commanded speed.
    fn speed_percent(&self) -> f64;

    /// Command a speed; values outside [0, 100] are clamped.
    fn set_speed_percent(&self, percent: f64) -> InstrumentResult<()>;
}

/// Diversion valve: open diverts to collection, closed to waste.
pub trait Valve: Send + Sync {
    fn is_open(&self) -> bool;

    fn set_open(&self, open: bool) -> InstrumentResult<()>;
}

/// Waste and collection vessel masses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceReading {
    #[serde(rename = "Waste Mass")]
    pub waste_mass: f64,
    #[serde(rename = "Collection Mass")]
    pub collection_mass: f64,
}

pub trait MassBalance: Send + Sync {
    fn read(&self) -> InstrumentResult<BalanceReading>;
}

pub(crate) fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) }
}
