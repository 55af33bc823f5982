//! Arrhenius kinetics.

use fc_core::constants::GAS_CONSTANT;

/// Rate constant `k0·exp(−Ea / (R·T))`.
#[inline]
pub fn arrhenius(k0: f64, activation_energy: f64, temperature_k: f64) -> f64 {
    k0 * (-activation_energy / (GAS_CONSTANT * temperature_k)).exp()
}

/// Fill `out` (length N−2) with the rate constant at each interior node of
/// `temperature` (length N).
pub fn arrhenius_profile(k0: f64, activation_energy: f64, temperature: &[f64], out: &mut [f64]) {
    debug_assert_eq!(out.len() + 2, temperature.len());
    for (k, t) in out.iter_mut().zip(&temperature[1..temperature.len() - 1]) {
        *k = arrhenius(k0, activation_energy, *t);
    }
}
