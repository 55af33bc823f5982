//! Shared in-memory plant for orchestration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use fc_app::{Actuators, Sensors};
use fc_instruments::{FixedBalance, ManualInstrument, RecordingPump, RecordingValve};
use fc_reactor::{CascadeInputs, CascadePrediction, ConcentrationPredictor};

pub struct Plant {
    pub flow_a: Arc<ManualInstrument>,
    pub flow_b: Arc<ManualInstrument>,
    pub flow_solvent: Arc<ManualInstrument>,
    pub temperature: Arc<ManualInstrument>,
    pub pump_a: Arc<RecordingPump>,
    pub pump_b: Arc<RecordingPump>,
    pub pump_solvent: Arc<RecordingPump>,
    pub valve: Arc<RecordingValve>,
}

impl Plant {
    /// All sensors already reporting nominal values.
    pub fn running(temperature_c: f64) -> Self {
        Self {
            flow_a: Arc::new(ManualInstrument::with_value("flow A", 2.5)),
            flow_b: Arc::new(ManualInstrument::with_value("flow B", 2.4)),
            flow_solvent: Arc::new(ManualInstrument::with_value("solvent flow", 2.5)),
            temperature: Arc::new(ManualInstrument::with_value("temperature", temperature_c)),
            pump_a: Arc::new(RecordingPump::new("pump A")),
            pump_b: Arc::new(RecordingPump::new("pump B")),
            pump_solvent: Arc::new(RecordingPump::new("solvent pump")),
            valve: Arc::new(RecordingValve::new()),
        }
    }

    pub fn sensors(&self) -> Sensors {
        Sensors {
            flow_a: self.flow_a.clone(),
            flow_b: self.flow_b.clone(),
            flow_solvent: self.flow_solvent.clone(),
            temperature: self.temperature.clone(),
            pressure: None,
        }
    }

    pub fn actuators(&self, balance: FixedBalance) -> Actuators {
        Actuators {
            pump_a: self.pump_a.clone(),
            pump_b: self.pump_b.clone(),
            pump_solvent: self.pump_solvent.clone(),
            valve: self.valve.clone(),
            balance: Arc::new(balance),
        }
    }
}

/// Predictor whose secondary output is set by the test.
#[derive(Clone, Default)]
pub struct Dial(pub Arc<Mutex<f64>>);

impl Dial {
    pub fn set(&self, secondary: f64) {
        *self.0.lock().unwrap() = secondary;
    }
}

impl ConcentrationPredictor for Dial {
    fn predict(&mut self, _inputs: &CascadeInputs) -> CascadePrediction {
        CascadePrediction {
            primary: 1.0,
            secondary: *self.0.lock().unwrap(),
        }
    }
}
