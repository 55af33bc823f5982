//! Transient tubular-reactor model for flowcascade.
//!
//! Provides:
//! - 1-D advection–dispersion–reaction solver with coupled energy balance
//!   (explicit upwind finite differences, A + B → C, Arrhenius kinetics)
//! - Real-time pacing of simulated time against the wall clock
//! - Two-reactor cascade whose first outlet feeds the second inlet
//! - The [`ConcentrationPredictor`] seam used by the control loop

pub mod cascade;
pub mod config;
pub mod error;
pub mod integrator;
pub mod kinetics;
pub mod state;
pub mod stencil;

pub use cascade::{CascadeInputs, CascadePrediction, ConcentrationPredictor, ReactorCascade};
pub use config::{CascadeConfig, ReactorConfig, ReactorGeometry, StabilityNumbers, StageConfig};
pub use error::{ReactorError, ReactorResult};
pub use integrator::{AdvanceReport, ReactorStateIntegrator};
pub use state::ReactorState;
