//! Process configuration, loaded from YAML.
//!
//! Every section falls back to the plant's standard settings, so an empty
//! document is a complete configuration.

use crate::error::{AppError, AppResult};
use fc_controls::PidGains;
use fc_instruments::OperatingRange;
use fc_reactor::CascadeConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub cascade: CascadeConfig,
    pub warmup: WarmupConfig,
    pub run: RunConfig,
    pub pumps: PumpConfig,
    pub instruments: InstrumentConfig,
    /// Closed-loop flow regulation. Absent means the pumps run at fixed
    /// speeds.
    pub flow_control: Option<FlowControlConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    pub poll_interval_s: f64,
    /// Reactor temperature band (°C) that ends warmup.
    pub operating_range: OperatingRange,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            poll_interval_s: 2.0,
            operating_range: OperatingRange::new(20.0, 153.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub tick_interval_s: f64,
    pub duration_s: f64,
    pub watchdog_poll_s: f64,
    /// Bound on waiting for the sampling thread after the run.
    pub join_timeout_s: f64,
    /// Moving-average window per flow channel.
    pub filter_window: usize,
    /// Predicted secondary outlet concentration (mg/mL) at or above which
    /// the stream is collected.
    pub collection_threshold: f64,
    /// Multiplier applied to both predictions before the threshold rule.
    pub correction_factor: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tick_interval_s: 0.1,
            duration_s: 24.0 * 3600.0 + 25.0 * 60.0,
            watchdog_poll_s: 1.0,
            join_timeout_s: 10.0,
            filter_window: 10,
            collection_threshold: 100.0,
            correction_factor: 0.96 * 0.98,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Speed every pump ramps to once warm (%).
    pub nominal_percent: f64,
    /// Highest speed the controller itself will command (%).
    pub ceiling_percent: f64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            nominal_percent: 50.0,
            ceiling_percent: 75.0,
        }
    }
}

/// Linear calibration of a flow meter log: `mL/min = counts × slope + intercept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMeterConfig {
    pub path: PathBuf,
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub flow_a: FlowMeterConfig,
    pub flow_b: FlowMeterConfig,
    pub flow_solvent: FlowMeterConfig,
    pub temperature_log: PathBuf,
    pub flow_poll_interval_s: f64,
    pub flow_smoothing_window: usize,
    pub temperature_poll_interval_s: f64,
    /// Actuator gateway.
    pub host: String,
    pub valve_port: u16,
    pub solvent_pump_port: u16,
    pub pump_b_port: u16,
    pub pump_a_port: u16,
    pub balance_port: u16,
    /// Pressure transmitter; not polled when absent.
    pub pressure_port: Option<u16>,
    /// How long to wait for every sensor's first reading.
    pub first_reading_timeout_s: f64,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        let meter = |path: &str, slope, intercept| FlowMeterConfig {
            path: PathBuf::from(path),
            slope,
            intercept,
        };
        Self {
            flow_a: meter("FlowA.csv", 0.0048, -0.9793),
            flow_b: meter("FlowB.csv", 0.0038, -0.7274),
            flow_solvent: meter("FlowSolvent.csv", 0.0041, -1.0507),
            temperature_log: PathBuf::from("Temperature.csv"),
            flow_poll_interval_s: 0.1,
            flow_smoothing_window: 12,
            temperature_poll_interval_s: 1.0,
            host: "127.0.0.1".to_string(),
            valve_port: 56000,
            solvent_pump_port: 56001,
            pump_b_port: 56002,
            pump_a_port: 56003,
            balance_port: 56004,
            pressure_port: None,
            first_reading_timeout_s: 60.0,
        }
    }
}

/// Per-channel flow setpoints (mL/min) shared by three PID loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowControlConfig {
    pub gains: PidGains,
    pub setpoint_a: f64,
    pub setpoint_b: f64,
    pub setpoint_solvent: f64,
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        Self {
            gains: PidGains {
                kp: 0.4,
                ki: 0.025,
                kd: 0.25,
                integral_limit: Some(10.0),
            },
            setpoint_a: 2.5,
            setpoint_b: 2.4,
            setpoint_solvent: 2.5,
        }
    }
}

impl ProcessConfig {
    pub fn load_yaml(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded process config");
        Ok(config)
    }

    /// Parse and validate. An empty document yields the defaults.
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: ProcessConfig = if content.trim().is_empty() {
            ProcessConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.cascade.primary.reactor.validate()?;
        self.cascade.secondary.reactor.validate()?;

        let intervals = [
            (self.warmup.poll_interval_s, "warmup.poll_interval_s"),
            (self.run.tick_interval_s, "run.tick_interval_s"),
            (self.run.watchdog_poll_s, "run.watchdog_poll_s"),
            (self.instruments.flow_poll_interval_s, "instruments.flow_poll_interval_s"),
            (
                self.instruments.temperature_poll_interval_s,
                "instruments.temperature_poll_interval_s",
            ),
        ];
        for (value, what) in intervals {
            if !(value.is_finite() && value > 0.0) {
                return Err(AppError::Config(format!("{what} must be positive, got {value}")));
            }
        }
        let bounds = [
            (self.run.duration_s, "run.duration_s"),
            (self.run.join_timeout_s, "run.join_timeout_s"),
            (self.instruments.first_reading_timeout_s, "instruments.first_reading_timeout_s"),
        ];
        for (value, what) in bounds {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AppError::Config(format!("{what} must be non-negative, got {value}")));
            }
        }
        if self.run.filter_window == 0 || self.instruments.flow_smoothing_window == 0 {
            return Err(AppError::Config("filter windows must hold at least one sample".into()));
        }
        if !self.run.collection_threshold.is_finite() || !self.run.correction_factor.is_finite() {
            return Err(AppError::Config("threshold and correction factor must be finite".into()));
        }
        for (value, what) in [
            (self.pumps.nominal_percent, "pumps.nominal_percent"),
            (self.pumps.ceiling_percent, "pumps.ceiling_percent"),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(AppError::Config(format!("{what} must lie in [0, 100], got {value}")));
            }
        }
        let band = self.warmup.operating_range;
        if !(band.low <= band.high) {
            return Err(AppError::Config("warmup.operating_range is empty".into()));
        }
        Ok(())
    }
}

/// Seconds from a validated config field.
pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl WarmupConfig {
    pub fn poll_interval(&self) -> Duration {
        secs(self.poll_interval_s)
    }
}

impl RunConfig {
    pub fn duration(&self) -> Duration {
        secs(self.duration_s)
    }

    pub fn watchdog_poll(&self) -> Duration {
        secs(self.watchdog_poll_s)
    }

    pub fn join_timeout(&self) -> Duration {
        secs(self.join_timeout_s)
    }
}
