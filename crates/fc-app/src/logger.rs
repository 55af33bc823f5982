//! Control-sample sinks.
//!
//! The production sink appends fixed-column CSV rows and flushes after every
//! row, so an aborted run keeps everything up to its last tick.

use crate::error::{AppError, AppResult};
use crate::sample::ControlSample;
use fc_core::lock_or_recover;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const CSV_HEADER: &str = "Timestamp,Human Timestamp,Pump A,Pump B,Solvent Pump,\
Flow A,Flow B,Solvent Flow,Temperature,Valve Set to Collection,Waste Mass,Collection Mass,\
Reactor 1 Product Concentration,Reactor 2 Product Concentration,Pressure";

/// Receives one [`ControlSample`] per tick.
pub trait DataSink: Send {
    fn record(&mut self, sample: &ControlSample) -> io::Result<()>;
}

pub struct CsvLogger<W: Write> {
    out: W,
}

impl CsvLogger<BufWriter<std::fs::File>> {
    /// Open `path` for appending and write the header.
    pub fn create(path: &Path) -> AppResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AppError::LogOpen {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self::new(BufWriter::new(file))?)
    }
}

impl<W: Write> CsvLogger<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{CSV_HEADER}")?;
        out.flush()?;
        Ok(Self { out })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_row(s: &ControlSample) -> String {
    let unix = s.timestamp.timestamp_micros() as f64 / 1e6;
    format!(
        "{unix:.6},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        s.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"),
        s.pump_a,
        s.pump_b,
        s.pump_solvent,
        optional(s.flow_a),
        optional(s.flow_b),
        optional(s.flow_solvent),
        optional(s.temperature_c),
        if s.valve_open { "True" } else { "False" },
        optional(s.waste_mass),
        optional(s.collection_mass),
        optional(s.primary_mg_per_ml),
        optional(s.secondary_mg_per_ml),
        optional(s.pressure),
    )
}

impl<W: Write + Send> DataSink for CsvLogger<W> {
    fn record(&mut self, sample: &ControlSample) -> io::Result<()> {
        writeln!(self.out, "{}", format_row(sample))?;
        self.out.flush()
    }
}

/// Keeps samples in memory behind a shared handle; clones see the same list.
#[derive(Debug, Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<ControlSample>>>);

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<ControlSample> {
        lock_or_recover(&self.0).clone()
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.0).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DataSink for SharedSink {
    fn record(&mut self, sample: &ControlSample) -> io::Result<()> {
        lock_or_recover(&self.0).push(sample.clone());
        Ok(())
    }
}
