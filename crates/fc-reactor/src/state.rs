//! Mutable field state of one reactor.

use crate::kinetics::arrhenius_profile;
use nalgebra::DVector;

/// Concentration and temperature profiles along the tube.
///
/// Node 0 is the inlet, node N−1 the outlet. The shadow `*_prev` arrays and
/// the reaction extent are scratch space for a single micro-step and are not
/// exposed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactorState {
    pub(crate) a: DVector<f64>,
    pub(crate) b: DVector<f64>,
    pub(crate) c: DVector<f64>,
    pub(crate) temperature: DVector<f64>,
    pub(crate) rate_constant: DVector<f64>,
    pub(crate) a_prev: DVector<f64>,
    pub(crate) b_prev: DVector<f64>,
    pub(crate) c_prev: DVector<f64>,
    pub(crate) t_prev: DVector<f64>,
    pub(crate) extent: DVector<f64>,
}

impl ReactorState {
    /// Reactants at the unit baseline, no product, uniform inlet temperature,
    /// rate constants evaluated at that temperature.
    pub fn initial(nodes: usize, inlet_temperature_k: f64, k0: f64, activation_energy: f64) -> Self {
        let temperature = DVector::from_element(nodes, inlet_temperature_k);
        let mut rate_constant = DVector::zeros(nodes - 2);
        arrhenius_profile(
            k0,
            activation_energy,
            temperature.as_slice(),
            rate_constant.as_mut_slice(),
        );
        Self {
            a: DVector::from_element(nodes, 1.0),
            b: DVector::from_element(nodes, 1.0),
            c: DVector::zeros(nodes),
            t_prev: temperature.clone(),
            temperature,
            rate_constant,
            a_prev: DVector::from_element(nodes, 1.0),
            b_prev: DVector::from_element(nodes, 1.0),
            c_prev: DVector::zeros(nodes),
            extent: DVector::zeros(nodes - 2),
        }
    }

    pub fn nodes(&self) -> usize {
        self.a.len()
    }

    pub fn concentration_a(&self) -> &DVector<f64> {
        &self.a
    }

    pub fn concentration_b(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn concentration_c(&self) -> &DVector<f64> {
        &self.c
    }

    pub fn temperature(&self) -> &DVector<f64> {
        &self.temperature
    }

    /// Interior rate constants (length N−2).
    pub fn rate_constant(&self) -> &DVector<f64> {
        &self.rate_constant
    }

    /// Product concentration at the outlet node (mol/m³).
    pub fn outlet_c(&self) -> f64 {
        self.c[self.nodes() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_profiles_have_matching_lengths() {
        let s = ReactorState::initial(7, 298.15, 923.8, 51_080.0);
        assert_eq!(s.nodes(), 7);
        assert_eq!(s.concentration_b().len(), 7);
        assert_eq!(s.concentration_c().len(), 7);
        assert_eq!(s.temperature().len(), 7);
        assert_eq!(s.rate_constant().len(), 5);
        assert!(s.concentration_a().iter().all(|v| *v == 1.0));
        assert_eq!(s.outlet_c(), 0.0);
        assert!(s.rate_constant().iter().all(|k| *k > 0.0));
    }
}
