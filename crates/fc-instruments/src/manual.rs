//! In-memory adapters: readings are pushed by the caller and actuator
//! commands are recorded instead of sent anywhere.

use crate::error::{InstrumentError, InstrumentResult};
use crate::reading::ReadingCell;
use crate::traits::{
    BalanceReading, Instrument, MassBalance, OperatingRange, Pump, Subscriber, Valve, clamp_percent,
};
use fc_core::lock_or_recover;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct ManualInstrument {
    name: String,
    cell: ReadingCell,
    closed: AtomicBool,
}

impl ManualInstrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell: ReadingCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_value(name: impl Into<String>, value: f64) -> Self {
        let inst = Self::new(name);
        inst.cell.publish(value);
        inst
    }

    /// Publish a reading exactly as a background reader would.
    pub fn set_value(&self, value: f64) {
        self.cell.publish(value);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Instrument for ManualInstrument {
    fn name(&self) -> &str {
        &self.name
    }

    fn current_value(&self) -> Option<f64> {
        self.cell.latest()
    }

    fn subscribe(&self, subscriber: Subscriber) {
        self.cell.subscribe(subscriber);
    }

    fn operating_range(&self) -> Option<OperatingRange> {
        self.cell.range()
    }

    fn set_operating_range(&self, range: Option<OperatingRange>) {
        self.cell.set_range(range);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct RecordingPump {
    name: String,
    commands: Mutex<Vec<f64>>,
}

impl RecordingPump {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Every speed sent so far, after clamping.
    pub fn commands(&self) -> Vec<f64> {
        lock_or_recover(&self.commands).clone()
    }
}

impl Pump for RecordingPump {
    fn name(&self) -> &str {
        &self.name
    }

    fn speed_percent(&self) -> f64 {
        lock_or_recover(&self.commands).last().copied().unwrap_or(0.0)
    }

    fn set_speed_percent(&self, percent: f64) -> InstrumentResult<()> {
        lock_or_recover(&self.commands).push(clamp_percent(percent));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingValve {
    commands: Mutex<Vec<bool>>,
}

impl RecordingValve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<bool> {
        lock_or_recover(&self.commands).clone()
    }
}

impl Valve for RecordingValve {
    fn is_open(&self) -> bool {
        lock_or_recover(&self.commands).last().copied().unwrap_or(false)
    }

    fn set_open(&self, open: bool) -> InstrumentResult<()> {
        lock_or_recover(&self.commands).push(open);
        Ok(())
    }
}

/// Returns a fixed reading, or fails every read when built with
/// [`FixedBalance::unavailable`].
#[derive(Debug, Clone, Copy)]
pub struct FixedBalance(Option<BalanceReading>);

impl FixedBalance {
    pub fn new(waste_mass: f64, collection_mass: f64) -> Self {
        Self(Some(BalanceReading {
            waste_mass,
            collection_mass,
        }))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl MassBalance for FixedBalance {
    fn read(&self) -> InstrumentResult<BalanceReading> {
        self.0.ok_or_else(|| InstrumentError::Timeout {
            what: "balance".to_string(),
        })
    }
}
