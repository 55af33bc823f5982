//! Lab units at the instrument boundary, SI inside the reactor model.
//!
//! Flow meters report mL/min and temperature probes °C; the model works in
//! m³/s and K. Conversions go through `uom` so the factors live in one place.

use uom::si::f64::{ThermodynamicTemperature, Time, Volume, VolumeRate};
use uom::si::thermodynamic_temperature::{degree_celsius, kelvin};
use uom::si::volume_rate::cubic_meter_per_second;

pub type Temperature = ThermodynamicTemperature;

/// Volumetric flow from a lab flow meter reading in mL/min.
#[inline]
pub fn ml_per_min(v: f64) -> VolumeRate {
    use uom::si::time::minute;
    use uom::si::volume::milliliter;
    Volume::new::<milliliter>(v) / Time::new::<minute>(1.0)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    VolumeRate::new::<cubic_meter_per_second>(v)
}

/// Raw SI value of a volumetric flow (m³/s), the unit the reactor model runs in.
#[inline]
pub fn to_m3ps(q: VolumeRate) -> f64 {
    q.get::<cubic_meter_per_second>()
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    Temperature::new::<degree_celsius>(v)
}

/// Convert a probe reading in °C straight to kelvin.
#[inline]
pub fn celsius_to_kelvin(v: f64) -> f64 {
    degc(v).get::<kelvin>()
}

/// Molar concentration (mol/m³) to mass concentration (mg/mL) for a species
/// of molecular weight `mw` (g/mol).
#[inline]
pub fn molar_to_mg_per_ml(c_mol_per_m3: f64, mw: f64) -> f64 {
    (c_mol_per_m3 / 1000.0) * mw
}

pub mod constants {
    /// Universal gas constant, J/(mol·K).
    pub const GAS_CONSTANT: f64 = 8.314;
}
