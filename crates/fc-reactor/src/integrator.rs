//! Explicit time integration of one tubular reactor.
//!
//! [`ReactorStateIntegrator::advance`] turns an amount of time into a whole
//! number of fixed micro-steps. With an explicit duration the count is
//! `⌊duration / dt⌋`; without one it is paced by the wall clock: the first call
//! runs a fixed bootstrap to settle the field, every later call runs as many
//! steps as wall time has elapsed since the previous call.

use crate::config::{ReactorConfig, ReactorGeometry, StabilityNumbers};
use crate::error::ReactorResult;
use crate::kinetics::arrhenius_profile;
use crate::state::ReactorState;
use crate::stencil::{
    ThermalCoefficients, TransportCoefficients, apply_boundaries, reaction_extent,
    temperature_interior, transport_interior,
};
use fc_core::{celsius_to_kelvin, molar_to_mg_per_ml, ratio_or_zero};
use std::time::{Duration, Instant};

/// Absorbs float representation error when converting a duration that is an
/// exact multiple of dt into a step count.
const STEP_COUNT_EPSILON: f64 = 1e-9;

/// Outcome of one [`ReactorStateIntegrator::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvanceReport {
    /// Micro-steps executed.
    pub steps: u64,
    /// Relative change of the product profile norm across the call,
    /// `|‖C_start‖ − ‖C_end‖| / ‖C_end‖`. `None` when nothing ran or the
    /// profile is empty.
    pub outlet_residual: Option<f64>,
}

impl AdvanceReport {
    /// Advisory convergence check; never used to gate stepping.
    pub fn converged(&self, tolerance: f64) -> bool {
        self.outlet_residual.is_some_and(|r| r <= tolerance)
    }
}

/// Advances one reactor's concentration and temperature fields.
#[derive(Debug, Clone)]
pub struct ReactorStateIntegrator {
    config: ReactorConfig,
    geometry: ReactorGeometry,
    state: ReactorState,
    flow_a: f64,
    flow_b: f64,
    stock_a: f64,
    stock_b: f64,
    wall_temperature_k: f64,
    last_real_time_mark: Option<Instant>,
}

impl ReactorStateIntegrator {
    /// Build an integrator for stock concentrations `stock_a`, `stock_b`
    /// (mol/m³).
    pub fn new(stock_a: f64, stock_b: f64, config: ReactorConfig) -> ReactorResult<Self> {
        let geometry = ReactorGeometry::derive(&config)?;
        let state = Self::initial_state(&config);
        Ok(Self {
            geometry,
            state,
            flow_a: 0.0,
            flow_b: 0.0,
            stock_a,
            stock_b,
            wall_temperature_k: celsius_to_kelvin(25.0),
            last_real_time_mark: None,
            config,
        })
    }

    fn initial_state(config: &ReactorConfig) -> ReactorState {
        ReactorState::initial(
            config.nodes,
            config.inlet_temperature_k,
            config.arrhenius_factor,
            config.activation_energy,
        )
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn geometry(&self) -> &ReactorGeometry {
        &self.geometry
    }

    pub fn state(&self) -> &ReactorState {
        &self.state
    }

    /// Restore the construction-time fields and forget the real-time mark.
    pub fn reset_state(&mut self) {
        self.state = Self::initial_state(&self.config);
        self.last_real_time_mark = None;
    }

    // --- stream inputs ---------------------------------------------------

    pub fn flow_a(&self) -> f64 {
        self.flow_a
    }

    /// Volumetric flow of the A feed (m³/s).
    pub fn set_flow_a(&mut self, flow_m3ps: f64) {
        self.flow_a = flow_m3ps;
    }

    pub fn flow_b(&self) -> f64 {
        self.flow_b
    }

    /// Volumetric flow of the B feed (m³/s).
    pub fn set_flow_b(&mut self, flow_m3ps: f64) {
        self.flow_b = flow_m3ps;
    }

    pub fn stock_a(&self) -> f64 {
        self.stock_a
    }

    pub fn set_stock_a(&mut self, concentration: f64) {
        self.stock_a = concentration;
    }

    pub fn stock_b(&self) -> f64 {
        self.stock_b
    }

    pub fn set_stock_b(&mut self, concentration: f64) {
        self.stock_b = concentration;
    }

    /// Temperature observed at the vessel wall (K).
    pub fn wall_temperature(&self) -> f64 {
        self.wall_temperature_k
    }

    pub fn set_wall_temperature(&mut self, kelvin: f64) {
        self.wall_temperature_k = kelvin;
    }

    pub fn set_wall_temperature_celsius(&mut self, celsius: f64) {
        self.wall_temperature_k = celsius_to_kelvin(celsius);
    }

    // --- derived quantities ---------------------------------------------

    pub fn combined_flow(&self) -> f64 {
        self.flow_a + self.flow_b
    }

    /// Mean stream velocity (m/s).
    pub fn stream_velocity(&self) -> f64 {
        self.combined_flow() / self.geometry.area_m2
    }

    /// Inlet concentration of A after mixing with the B feed; 0 with no flow.
    pub fn stream_concentration_a(&self) -> f64 {
        self.stock_a * ratio_or_zero(self.flow_a, self.combined_flow())
    }

    pub fn stream_concentration_b(&self) -> f64 {
        self.stock_b * ratio_or_zero(self.flow_b, self.combined_flow())
    }

    /// Outlet product concentration (mol/m³).
    pub fn outlet_concentration(&self) -> f64 {
        self.state.outlet_c()
    }

    /// Outlet product concentration (mg/mL).
    pub fn product_concentration(&self) -> f64 {
        molar_to_mg_per_ml(self.state.outlet_c(), self.config.molecular_weight)
    }

    pub fn stability(&self) -> StabilityNumbers {
        self.geometry.stability(self.stream_velocity())
    }

    // --- time stepping --------------------------------------------------

    /// Number of whole micro-steps covering `duration`.
    pub fn steps_for(&self, duration: Duration) -> u64 {
        (duration.as_secs_f64() / self.geometry.dt_s + STEP_COUNT_EPSILON).floor() as u64
    }

    /// Advance by `duration`, or by the wall time elapsed since the previous
    /// paced call when `None`.
    pub fn advance(&mut self, duration: Option<Duration>) -> AdvanceReport {
        self.advance_at(duration, Instant::now())
    }

    /// [`advance`](Self::advance) with an explicit notion of "now".
    pub fn advance_at(&mut self, duration: Option<Duration>, now: Instant) -> AdvanceReport {
        let steps = match duration {
            Some(d) => self.steps_for(d),
            None => match self.last_real_time_mark.replace(now) {
                None => self.config.bootstrap_steps,
                Some(mark) => self.steps_for(now.saturating_duration_since(mark)),
            },
        };

        if steps == 0 {
            return AdvanceReport {
                steps: 0,
                outlet_residual: None,
            };
        }

        let norm_start = self.state.c.norm();
        for _ in 0..steps {
            self.step();
        }
        let norm_end = self.state.c.norm();

        let outlet_residual = (norm_end > 0.0).then(|| (norm_start - norm_end).abs() / norm_end);
        tracing::debug!(steps, ?outlet_residual, "reactor advanced");
        AdvanceReport {
            steps,
            outlet_residual,
        }
    }

    /// Execute exactly one micro-step.
    pub fn step(&mut self) {
        let velocity = self.stream_velocity();
        let inlet_a = self.stream_concentration_a();
        let inlet_b = self.stream_concentration_b();
        let wall_temperature = self.wall_temperature_k;
        let g = self.geometry;
        let courant = g.courant(velocity);
        let transport = TransportCoefficients {
            courant,
            dispersion: g.dispersion_number,
        };
        let thermal = ThermalCoefficients {
            courant,
            lambda: g.lambda,
            wall_exchange: g.wall_exchange,
            heat_release: g.heat_release,
        };

        let ReactorState {
            a,
            b,
            c,
            temperature,
            rate_constant,
            a_prev,
            b_prev,
            c_prev,
            t_prev,
            extent,
        } = &mut self.state;

        apply_boundaries(temperature.as_mut_slice(), self.config.inlet_temperature_k);
        apply_boundaries(a.as_mut_slice(), inlet_a);
        apply_boundaries(b.as_mut_slice(), inlet_b);
        apply_boundaries(c.as_mut_slice(), 0.0);

        t_prev.copy_from(&*temperature);
        a_prev.copy_from(&*a);
        b_prev.copy_from(&*b);
        c_prev.copy_from(&*c);

        // Rate constants still reflect the previous step's temperature.
        reaction_extent(
            rate_constant.as_slice(),
            a_prev.as_slice(),
            b_prev.as_slice(),
            g.dt_s,
            extent.as_mut_slice(),
        );

        temperature_interior(
            t_prev.as_slice(),
            thermal,
            wall_temperature,
            extent.as_slice(),
            temperature.as_mut_slice(),
        );
        transport_interior(a_prev.as_slice(), transport, extent.as_slice(), -1.0, a.as_mut_slice());
        transport_interior(b_prev.as_slice(), transport, extent.as_slice(), -1.0, b.as_mut_slice());
        transport_interior(c_prev.as_slice(), transport, extent.as_slice(), 1.0, c.as_mut_slice());

        arrhenius_profile(
            self.config.arrhenius_factor,
            self.config.activation_energy,
            temperature.as_slice(),
            rate_constant.as_mut_slice(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ReactorConfig {
        ReactorConfig {
            nodes: 20,
            ..ReactorConfig::default()
        }
    }

    #[test]
    fn stream_concentration_is_zero_without_flow() {
        let r = ReactorStateIntegrator::new(1200.0, 1000.0, small()).unwrap();
        assert_eq!(r.combined_flow(), 0.0);
        assert_eq!(r.stream_concentration_a(), 0.0);
        assert_eq!(r.stream_concentration_b(), 0.0);
    }

    #[test]
    fn stream_concentration_follows_flow_fraction() {
        let mut r = ReactorStateIntegrator::new(1200.0, 1000.0, small()).unwrap();
        r.set_flow_a(3e-8);
        r.set_flow_b(1e-8);
        assert!((r.stream_concentration_a() - 900.0).abs() < 1e-9);
        assert!((r.stream_concentration_b() - 250.0).abs() < 1e-9);
        assert!((r.stream_velocity() - 4e-8 / r.geometry().area_m2).abs() < 1e-15);
    }

    #[test]
    fn step_respects_boundary_rules() {
        let mut r = ReactorStateIntegrator::new(1200.0, 1000.0, small()).unwrap();
        r.set_flow_a(4e-8);
        r.set_flow_b(4e-8);
        r.step();
        r.step();
        let s = r.state();
        let n = s.nodes();
        assert_eq!(s.concentration_a()[0], 600.0);
        assert_eq!(s.concentration_b()[0], 500.0);
        assert_eq!(s.concentration_c()[0], 0.0);
        assert_eq!(s.temperature()[0], r.config().inlet_temperature_k);
        assert!(s.concentration_a().iter().all(|v| v.is_finite()));
        assert!(s.temperature()[n - 1].is_finite());
    }

    #[test]
    fn explicit_duration_maps_to_whole_steps() {
        let r = ReactorStateIntegrator::new(1.0, 1.0, small()).unwrap();
        let dt = r.geometry().dt_s;
        assert_eq!(r.steps_for(Duration::from_secs_f64(10.0 * dt)), 10);
        assert_eq!(r.steps_for(Duration::from_secs_f64(0.5 * dt)), 0);
        assert_eq!(r.steps_for(Duration::ZERO), 0);
    }

    #[test]
    fn zero_step_advance_has_no_side_effects() {
        let mut r = ReactorStateIntegrator::new(1.0, 1.0, small()).unwrap();
        let before = r.state().clone();
        let report = r.advance(Some(Duration::ZERO));
        assert_eq!(report.steps, 0);
        assert_eq!(report.outlet_residual, None);
        assert_eq!(r.state(), &before);
    }

    #[test]
    fn reset_restores_initial_fields() {
        let mut r = ReactorStateIntegrator::new(1200.0, 1000.0, small()).unwrap();
        r.set_flow_a(4e-8);
        r.set_flow_b(4e-8);
        r.advance(Some(Duration::from_secs(1)));
        r.reset_state();
        let fresh = ReactorStateIntegrator::new(1200.0, 1000.0, small()).unwrap();
        assert_eq!(r.state(), fresh.state());
    }

    #[test]
    fn advance_report_convergence_is_advisory() {
        let report = AdvanceReport {
            steps: 3,
            outlet_residual: Some(1e-10),
        };
        assert!(report.converged(1e-8));
        assert!(!AdvanceReport { steps: 0, outlet_residual: None }.converged(1e-8));
    }
}
