//! Two reactors in series.
//!
//! The primary reactor mixes feeds A and B. Its whole outlet stream becomes the
//! A feed of the secondary reactor, diluted by an independent solvent/B feed
//! and held at a quench temperature. The secondary's A stock concentration is
//! re-coupled to the primary outlet on every step.

use crate::config::CascadeConfig;
use crate::error::ReactorResult;
use crate::integrator::ReactorStateIntegrator;
use fc_core::celsius_to_kelvin;
use std::time::Duration;

/// Filtered live inputs for one control tick, in SI units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CascadeInputs {
    /// Primary A feed (m³/s).
    pub flow_a: f64,
    /// Primary B feed (m³/s).
    pub flow_b: f64,
    /// Secondary solvent/B feed (m³/s).
    pub solvent_flow: f64,
    /// Primary wall temperature (K).
    pub temperature_k: f64,
}

/// Predicted outlet product concentrations (mg/mL).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CascadePrediction {
    pub primary: f64,
    pub secondary: f64,
}

impl CascadePrediction {
    /// Apply a recovery/correction factor to both predictions.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            primary: self.primary * factor,
            secondary: self.secondary * factor,
        }
    }
}

/// Anything that turns live inputs into predicted outlet concentrations.
///
/// The control loop only depends on this trait, so alternative models can be
/// driven by the same sampling cycle.
pub trait ConcentrationPredictor: Send {
    fn predict(&mut self, inputs: &CascadeInputs) -> CascadePrediction;
}

#[derive(Debug, Clone)]
pub struct ReactorCascade {
    primary: ReactorStateIntegrator,
    secondary: ReactorStateIntegrator,
    quench_temperature_k: f64,
}

impl ReactorCascade {
    pub fn new(
        primary: ReactorStateIntegrator,
        secondary: ReactorStateIntegrator,
        quench_temperature_k: f64,
    ) -> Self {
        Self {
            primary,
            secondary,
            quench_temperature_k,
        }
    }

    pub fn from_config(config: &CascadeConfig) -> ReactorResult<Self> {
        let primary = ReactorStateIntegrator::new(
            config.primary.stock_a,
            config.primary.stock_b,
            config.primary.reactor.clone(),
        )?;
        let secondary = ReactorStateIntegrator::new(
            config.secondary.stock_a,
            config.secondary.stock_b,
            config.secondary.reactor.clone(),
        )?;
        Ok(Self::new(
            primary,
            secondary,
            celsius_to_kelvin(config.quench_temperature_c),
        ))
    }

    pub fn primary(&self) -> &ReactorStateIntegrator {
        &self.primary
    }

    pub fn secondary(&self) -> &ReactorStateIntegrator {
        &self.secondary
    }

    /// Current outlet predictions without stepping.
    pub fn prediction(&self) -> CascadePrediction {
        CascadePrediction {
            primary: self.primary.product_concentration(),
            secondary: self.secondary.product_concentration(),
        }
    }

    /// Advance both reactors by the wall time since the previous call.
    pub fn step(&mut self, inputs: &CascadeInputs) -> CascadePrediction {
        self.step_with(inputs, None)
    }

    /// Advance both reactors by a fixed amount of simulated time.
    pub fn step_for(&mut self, inputs: &CascadeInputs, duration: Duration) -> CascadePrediction {
        self.step_with(inputs, Some(duration))
    }

    fn step_with(&mut self, inputs: &CascadeInputs, duration: Option<Duration>) -> CascadePrediction {
        self.primary.set_wall_temperature(inputs.temperature_k);
        self.primary.set_flow_a(inputs.flow_a);
        self.primary.set_flow_b(inputs.flow_b);
        let first = self.primary.advance(duration);

        self.secondary.set_wall_temperature(self.quench_temperature_k);
        self.secondary.set_flow_a(self.primary.combined_flow());
        self.secondary.set_flow_b(inputs.solvent_flow);
        self.secondary.set_stock_a(self.primary.outlet_concentration());
        let second = self.secondary.advance(duration);

        tracing::debug!(
            primary_steps = first.steps,
            secondary_steps = second.steps,
            "cascade stepped"
        );
        self.prediction()
    }
}

impl ConcentrationPredictor for ReactorCascade {
    fn predict(&mut self, inputs: &CascadeInputs) -> CascadePrediction {
        self.step(inputs)
    }
}
