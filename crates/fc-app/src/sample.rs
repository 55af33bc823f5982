use chrono::{DateTime, Local};

/// Everything observed and decided in one control tick.
///
/// Warmup status rows carry the raw readings that are available and no
/// predictions; control ticks fill every reading and prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSample {
    pub timestamp: DateTime<Local>,
    /// Commanded pump speeds (%).
    pub pump_a: f64,
    pub pump_b: f64,
    pub pump_solvent: f64,
    /// Flow rates (mL/min); filtered and non-negative on control ticks.
    pub flow_a: Option<f64>,
    pub flow_b: Option<f64>,
    pub flow_solvent: Option<f64>,
    /// Reactor wall temperature (°C).
    pub temperature_c: Option<f64>,
    /// `true` when diverting to collection.
    pub valve_open: bool,
    pub waste_mass: Option<f64>,
    pub collection_mass: Option<f64>,
    /// Corrected outlet predictions (mg/mL).
    pub primary_mg_per_ml: Option<f64>,
    pub secondary_mg_per_ml: Option<f64>,
    pub pressure: Option<f64>,
}
