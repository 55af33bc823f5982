//! The steady-state control tick.
//!
//! One tick is strictly sequential: read sensors, filter, drive the
//! predictor, decide, actuate the valve, log. A failing tick is reported to
//! the caller; [`SamplingCycle::run`] logs it and carries on with the next one.

use crate::config::RunConfig;
use crate::error::{AppResult, TickError};
use crate::logger::DataSink;
use crate::sample::ControlSample;
use crate::wiring::{Actuators, Sensors};
use fc_controls::{SampleConfig, SlidingWindowFilter};
use fc_core::timing::{TickStats, Timer};
use fc_core::{StopSignal, celsius_to_kelvin, ml_per_min, to_m3ps};
use fc_instruments::Instrument;
use fc_reactor::{CascadeInputs, ConcentrationPredictor};
use std::sync::Arc;

/// Decision parameters of the sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSettings {
    pub tick: SampleConfig,
    pub filter_window: usize,
    pub collection_threshold: f64,
    pub correction_factor: f64,
}

impl CycleSettings {
    pub fn from_run(run: &RunConfig) -> AppResult<Self> {
        Ok(Self {
            tick: SampleConfig::new(run.tick_interval_s)?,
            filter_window: run.filter_window,
            collection_threshold: run.collection_threshold,
            correction_factor: run.correction_factor,
        })
    }
}

struct FlowFilters {
    a: SlidingWindowFilter,
    b: SlidingWindowFilter,
    solvent: SlidingWindowFilter,
}

pub struct SamplingCycle<P> {
    predictor: P,
    sensors: Sensors,
    actuators: Actuators,
    sink: Box<dyn DataSink>,
    filters: FlowFilters,
    settings: CycleSettings,
    ticks: u64,
    skipped: u64,
    tick_stats: TickStats,
}

fn read(instrument: &Arc<dyn Instrument>, channel: &'static str) -> Result<f64, TickError> {
    let value = instrument
        .current_value()
        .ok_or(TickError::MissingReading { channel })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TickError::Numeric {
            what: channel,
            value,
        })
    }
}

impl<P: ConcentrationPredictor> SamplingCycle<P> {
    pub fn new(
        predictor: P,
        sensors: Sensors,
        actuators: Actuators,
        sink: Box<dyn DataSink>,
        settings: CycleSettings,
    ) -> AppResult<Self> {
        let window = || SlidingWindowFilter::new(settings.filter_window);
        Ok(Self {
            predictor,
            sensors,
            actuators,
            sink,
            filters: FlowFilters {
                a: window()?,
                b: window()?,
                solvent: window()?,
            },
            settings,
            ticks: 0,
            skipped: 0,
            tick_stats: TickStats::new(),
        })
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks abandoned because of a [`TickError`].
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped
    }

    /// Mean tick duration, when `FC_TIMING` is set.
    pub fn average_tick_seconds(&self) -> Option<f64> {
        self.tick_stats.average().map(|d| d.as_secs_f64())
    }

    /// Run one control tick and return what was logged.
    pub fn tick(&mut self) -> Result<ControlSample, TickError> {
        let temperature_c = read(&self.sensors.temperature, "temperature")?;
        let raw_a = read(&self.sensors.flow_a, "flow A")?;
        let raw_b = read(&self.sensors.flow_b, "flow B")?;
        let raw_solvent = read(&self.sensors.flow_solvent, "solvent flow")?;

        let flow_a = self.filters.a.push(raw_a).max(0.0);
        let flow_b = self.filters.b.push(raw_b).max(0.0);
        let flow_solvent = self.filters.solvent.push(raw_solvent).max(0.0);

        let inputs = CascadeInputs {
            flow_a: to_m3ps(ml_per_min(flow_a)),
            flow_b: to_m3ps(ml_per_min(flow_b)),
            solvent_flow: to_m3ps(ml_per_min(flow_solvent)),
            temperature_k: celsius_to_kelvin(temperature_c),
        };
        let prediction = self
            .predictor
            .predict(&inputs)
            .scaled(self.settings.correction_factor);

        // NaN compares false, so an unusable prediction diverts to waste.
        let collect = prediction.secondary >= self.settings.collection_threshold;
        self.actuators.valve.set_open(collect)?;

        let (waste_mass, collection_mass) = self.balance_masses();
        let pressure = self.pressure();

        let sample = ControlSample {
            timestamp: chrono::Local::now(),
            pump_a: self.actuators.pump_a.speed_percent(),
            pump_b: self.actuators.pump_b.speed_percent(),
            pump_solvent: self.actuators.pump_solvent.speed_percent(),
            flow_a: Some(flow_a),
            flow_b: Some(flow_b),
            flow_solvent: Some(flow_solvent),
            temperature_c: Some(temperature_c),
            valve_open: collect,
            waste_mass,
            collection_mass,
            primary_mg_per_ml: Some(prediction.primary),
            secondary_mg_per_ml: Some(prediction.secondary),
            pressure,
        };
        self.sink.record(&sample)?;

        tracing::info!(
            flow_a,
            flow_b,
            flow_solvent,
            temperature_c,
            primary = prediction.primary,
            secondary = prediction.secondary,
            collect,
            "control sample"
        );
        Ok(sample)
    }

    /// Log the plant as it stands, without filtering, predicting or
    /// actuating. Used while waiting for the reactor to reach temperature.
    pub fn record_status(&mut self) -> Result<ControlSample, TickError> {
        let (waste_mass, collection_mass) = self.balance_masses();
        let sample = ControlSample {
            timestamp: chrono::Local::now(),
            pump_a: self.actuators.pump_a.speed_percent(),
            pump_b: self.actuators.pump_b.speed_percent(),
            pump_solvent: self.actuators.pump_solvent.speed_percent(),
            flow_a: self.sensors.flow_a.current_value(),
            flow_b: self.sensors.flow_b.current_value(),
            flow_solvent: self.sensors.flow_solvent.current_value(),
            temperature_c: self.sensors.temperature.current_value(),
            valve_open: self.actuators.valve.is_open(),
            waste_mass,
            collection_mass,
            primary_mg_per_ml: None,
            secondary_mg_per_ml: None,
            pressure: self.pressure(),
        };
        self.sink.record(&sample)?;
        Ok(sample)
    }

    fn balance_masses(&self) -> (Option<f64>, Option<f64>) {
        match self.actuators.balance.read() {
            Ok(reading) => (Some(reading.waste_mass), Some(reading.collection_mass)),
            Err(err) => {
                tracing::warn!(error = %err, "balance read failed");
                (None, None)
            }
        }
    }

    fn pressure(&self) -> Option<f64> {
        self.sensors
            .pressure
            .as_ref()
            .and_then(|p| p.current_value())
    }

    /// Tick until `stop` is requested, then hand the cycle back.
    pub fn run(mut self, stop: StopSignal) -> Self {
        let period = self.settings.tick.period();
        tracing::info!(tick_s = period.as_secs_f64(), "sampling cycle started");
        while !stop.is_requested() {
            let timer = Timer::start();
            match self.tick() {
                Ok(_) => self.ticks += 1,
                Err(err) => {
                    self.skipped += 1;
                    tracing::warn!(error = %err, "control tick skipped");
                }
            }
            if let Some(elapsed) = timer.stop() {
                self.tick_stats.record(elapsed);
            }
            if stop.sleep(period) {
                break;
            }
        }
        if let Some(load) = self.tick_stats.load(period).filter(|l| *l > 1.0) {
            tracing::warn!(load, "ticks took longer than the tick period on average");
        }
        tracing::info!(ticks = self.ticks, skipped = self.skipped, "sampling cycle stopped");
        self
    }
}
