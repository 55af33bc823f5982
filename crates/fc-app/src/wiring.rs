//! Explicit construction of the plant's sensors and actuators.

use crate::config::{FlowMeterConfig, InstrumentConfig, secs};
use crate::error::AppResult;
use fc_instruments::{
    FlowMeterParser, Instrument, MassBalance, Pump, SocketBalance, SocketPump, SocketQuerySource,
    SocketValve, StreamingInstrument, StreamingOptions, TailSource, TemperatureParser, Valve,
};
use std::sync::Arc;
use std::time::Duration;

/// Live sensor channels read by the control loop.
#[derive(Clone)]
pub struct Sensors {
    pub flow_a: Arc<dyn Instrument>,
    pub flow_b: Arc<dyn Instrument>,
    pub flow_solvent: Arc<dyn Instrument>,
    /// Reactor wall temperature (°C).
    pub temperature: Arc<dyn Instrument>,
    pub pressure: Option<Arc<dyn Instrument>>,
}

impl Sensors {
    /// Channels the control loop cannot run without.
    pub fn required(&self) -> [&Arc<dyn Instrument>; 4] {
        [&self.temperature, &self.flow_a, &self.flow_b, &self.flow_solvent]
    }

    pub fn close_all(&self) {
        for sensor in self.required() {
            sensor.close();
        }
        if let Some(pressure) = &self.pressure {
            pressure.close();
        }
    }
}

/// Commanded devices.
#[derive(Clone)]
pub struct Actuators {
    pub pump_a: Arc<dyn Pump>,
    pub pump_b: Arc<dyn Pump>,
    pub pump_solvent: Arc<dyn Pump>,
    pub valve: Arc<dyn Valve>,
    pub balance: Arc<dyn MassBalance>,
}

impl Actuators {
    pub fn pumps(&self) -> [&Arc<dyn Pump>; 3] {
        [&self.pump_a, &self.pump_b, &self.pump_solvent]
    }
}

fn flow_meter(
    name: &str,
    meter: &FlowMeterConfig,
    config: &InstrumentConfig,
) -> AppResult<Arc<dyn Instrument>> {
    let source = TailSource::open(&meter.path, FlowMeterParser::new(meter.slope, meter.intercept))?;
    let options = StreamingOptions {
        poll_interval: secs(config.flow_poll_interval_s),
        smoothing_window: Some(config.flow_smoothing_window),
        ..StreamingOptions::flow_meter()
    };
    Ok(Arc::new(StreamingInstrument::spawn(name, source, options)?))
}

/// Open every instrument log and connect every actuator.
///
/// Any connection failure is fatal: the process cannot run without its
/// hardware.
pub fn connect_hardware(config: &InstrumentConfig) -> AppResult<(Sensors, Actuators)> {
    let temperature_source = TailSource::open(&config.temperature_log, TemperatureParser)?;
    let temperature: Arc<dyn Instrument> = Arc::new(StreamingInstrument::spawn(
        "temperature",
        temperature_source,
        StreamingOptions {
            poll_interval: secs(config.temperature_poll_interval_s),
            ..StreamingOptions::temperature_probe()
        },
    )?);

    let pressure = match config.pressure_port {
        Some(port) => {
            let source = SocketQuerySource::connect(&config.host, port, "GetValue")?;
            let options = StreamingOptions {
                poll_interval: Duration::from_secs(1),
                ..StreamingOptions::default()
            };
            Some(Arc::new(StreamingInstrument::spawn("pressure", source, options)?) as Arc<dyn Instrument>)
        }
        None => None,
    };

    let sensors = Sensors {
        flow_a: flow_meter("flow A", &config.flow_a, config)?,
        flow_b: flow_meter("flow B", &config.flow_b, config)?,
        flow_solvent: flow_meter("solvent flow", &config.flow_solvent, config)?,
        temperature,
        pressure,
    };

    let host = config.host.as_str();
    let actuators = Actuators {
        valve: Arc::new(SocketValve::connect(host, config.valve_port)?),
        pump_solvent: Arc::new(SocketPump::connect("solvent pump", host, config.solvent_pump_port)?),
        pump_b: Arc::new(SocketPump::connect("pump B", host, config.pump_b_port)?),
        pump_a: Arc::new(SocketPump::connect("pump A", host, config.pump_a_port)?),
        balance: Arc::new(SocketBalance::connect(host, config.balance_port)?),
    };
    tracing::info!(host, "instruments connected");
    Ok((sensors, actuators))
}
