//! Reactor geometry, physical properties and kinetics.
//!
//! [`ReactorConfig`] holds what an operator configures; [`ReactorGeometry`]
//! holds everything derived from it once at construction. Both are immutable
//! for the lifetime of an integrator.

use crate::error::{ReactorError, ReactorResult};
use fc_core::{celsius_to_kelvin, ensure_finite};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration of one tubular reactor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Tube inner diameter (m).
    pub diameter_m: f64,
    /// Reactor volume (m³). Tube length is derived from it.
    pub volume_m3: f64,
    /// Number of spatial nodes, inlet and outlet included.
    pub nodes: usize,
    /// Base micro-step (s).
    pub time_step_s: f64,
    /// Axial dispersion coefficient (m²/s).
    pub axial_dispersion_m2ps: f64,
    /// Fluid thermal conductivity (W/(m·K)).
    pub thermal_conductivity: f64,
    /// Fluid density (kg/m³).
    pub density: f64,
    /// Fluid specific heat (J/(kg·K)).
    pub specific_heat: f64,
    /// Nusselt number for laminar tube flow.
    pub nusselt: f64,
    /// Stream temperature at the inlet (K).
    pub inlet_temperature_k: f64,
    /// Heat of reaction (J/mol).
    pub heat_of_reaction: f64,
    /// Arrhenius activation energy (J/mol).
    pub activation_energy: f64,
    /// Arrhenius pre-exponential factor (m³/(mol·s)).
    pub arrhenius_factor: f64,
    /// Product molecular weight (g/mol).
    pub molecular_weight: f64,
    /// Relative outlet-norm change reported as converged. Advisory only.
    pub convergence_tolerance: f64,
    /// Micro-steps run on the first real-time advance.
    pub bootstrap_steps: u64,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            diameter_m: 0.001_587_5,
            volume_m3: 2.0e-5,
            nodes: 50,
            time_step_s: 0.0075,
            axial_dispersion_m2ps: 5.0e-4,
            thermal_conductivity: 0.12,
            density: 1750.0,
            specific_heat: 1172.0,
            nusselt: 3.66,
            inlet_temperature_k: celsius_to_kelvin(25.0),
            heat_of_reaction: 0.0,
            activation_energy: 51_080.0,
            arrhenius_factor: 923.8,
            molecular_weight: 334.17,
            convergence_tolerance: 1e-8,
            bootstrap_steps: 1000,
        }
    }
}

impl ReactorConfig {
    /// Check the configuration can build a solvable grid.
    ///
    /// Numerical stability of the explicit scheme is NOT checked here; see
    /// [`ReactorGeometry::stability`].
    pub fn validate(&self) -> ReactorResult<()> {
        if self.nodes < 3 {
            return Err(ReactorError::InvalidArg {
                what: "reactor needs at least 3 nodes",
            });
        }
        let positive = [
            (self.diameter_m, "diameter_m"),
            (self.volume_m3, "volume_m3"),
            (self.time_step_s, "time_step_s"),
            (self.thermal_conductivity, "thermal_conductivity"),
            (self.density, "density"),
            (self.specific_heat, "specific_heat"),
            (self.inlet_temperature_k, "inlet_temperature_k"),
            (self.molecular_weight, "molecular_weight"),
        ];
        for (value, what) in positive {
            ensure_finite(value, what)?;
            if value <= 0.0 {
                return Err(ReactorError::InvalidArg {
                    what: "geometry, properties and time step must be positive",
                });
            }
        }
        let finite = [
            (self.axial_dispersion_m2ps, "axial_dispersion_m2ps"),
            (self.nusselt, "nusselt"),
            (self.heat_of_reaction, "heat_of_reaction"),
            (self.activation_energy, "activation_energy"),
            (self.arrhenius_factor, "arrhenius_factor"),
            (self.convergence_tolerance, "convergence_tolerance"),
        ];
        for (value, what) in finite {
            ensure_finite(value, what)?;
        }
        if self.axial_dispersion_m2ps < 0.0 || self.nusselt < 0.0 || self.arrhenius_factor < 0.0 {
            return Err(ReactorError::InvalidArg {
                what: "dispersion, Nusselt number and Arrhenius factor must be non-negative",
            });
        }
        Ok(())
    }
}

/// Dimensionless numbers governing the explicit scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityNumbers {
    /// u·dt/dx
    pub courant: f64,
    /// D_ax·dt/dx²
    pub dispersion: f64,
    /// α·dt/dx²
    pub thermal: f64,
}

impl StabilityNumbers {
    /// Classical sufficient condition for the upwind/central explicit scheme:
    /// `C + 2d ≤ 1` for both the species and the thermal diffusion numbers.
    pub fn within_explicit_limit(&self) -> bool {
        self.courant + 2.0 * self.dispersion <= 1.0 && self.courant + 2.0 * self.thermal <= 1.0
    }
}

/// Quantities derived once from a [`ReactorConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactorGeometry {
    /// Cross-sectional area (m²).
    pub area_m2: f64,
    /// Wetted perimeter (m).
    pub perimeter_m: f64,
    /// Tube length (m).
    pub length_m: f64,
    /// Node spacing (m).
    pub dx_m: f64,
    /// Micro-step (s).
    pub dt_s: f64,
    /// k/(ρ·Cp) (m²/s).
    pub thermal_diffusivity: f64,
    /// Nu·k/D (W/(m²·K)).
    pub convective_coefficient: f64,
    /// α·dt/dx²
    pub lambda: f64,
    /// D_ax·dt/dx²
    pub dispersion_number: f64,
    /// h·perimeter·dt/(ρ·Cp)·(L/V): lumped wall exchange per micro-step.
    pub wall_exchange: f64,
    /// ΔH_r/(ρ·Cp): temperature change per unit reaction extent (K·m³/mol).
    pub heat_release: f64,
}

impl ReactorGeometry {
    pub fn derive(config: &ReactorConfig) -> ReactorResult<Self> {
        config.validate()?;

        let area_m2 = PI * (config.diameter_m / 2.0).powi(2);
        let perimeter_m = PI * config.diameter_m;
        let length_m = config.volume_m3 / area_m2;
        let dx_m = length_m / (config.nodes - 1) as f64;
        let dt_s = config.time_step_s;
        let rho_cp = config.density * config.specific_heat;
        let thermal_diffusivity = config.thermal_conductivity / rho_cp;
        let convective_coefficient = config.nusselt * config.thermal_conductivity / config.diameter_m;

        Ok(Self {
            area_m2,
            perimeter_m,
            length_m,
            dx_m,
            dt_s,
            thermal_diffusivity,
            convective_coefficient,
            lambda: thermal_diffusivity * dt_s / dx_m.powi(2),
            dispersion_number: config.axial_dispersion_m2ps * dt_s / dx_m.powi(2),
            wall_exchange: convective_coefficient * perimeter_m * dt_s / rho_cp * length_m
                / config.volume_m3,
            heat_release: config.heat_of_reaction / rho_cp,
        })
    }

    /// Courant number for a given mean stream velocity (m/s).
    pub fn courant(&self, velocity: f64) -> f64 {
        velocity * self.dt_s / self.dx_m
    }

    pub fn stability(&self, velocity: f64) -> StabilityNumbers {
        StabilityNumbers {
            courant: self.courant(velocity),
            dispersion: self.dispersion_number,
            thermal: self.lambda,
        }
    }
}

/// One stage of a cascade: reactor configuration plus stock concentrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Stock concentration of species A (mol/m³).
    pub stock_a: f64,
    /// Stock concentration of species B (mol/m³).
    pub stock_b: f64,
    #[serde(flatten)]
    pub reactor: ReactorConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            stock_a: 1.0,
            stock_b: 1.0,
            reactor: ReactorConfig::default(),
        }
    }
}

/// Two-reactor cascade configuration.
///
/// Each stage deserializes as an overlay on that stage's own default, so a
/// document naming one field of `primary` keeps the rest of the primary
/// defaults rather than the generic [`StageConfig`] ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeConfig {
    pub primary: StageConfig,
    /// Secondary stage. Its stock A is replaced every tick by the primary outlet.
    pub secondary: StageConfig,
    /// Stream temperature imposed on the secondary stage (°C).
    pub quench_temperature_c: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            primary: StageConfig {
                stock_a: 1200.0,
                stock_b: 1000.0,
                reactor: ReactorConfig {
                    nodes: 500,
                    volume_m3: 10.0e-6,
                    time_step_s: 0.005,
                    ..ReactorConfig::default()
                },
            },
            secondary: StageConfig {
                stock_a: 1.0,
                stock_b: 1250.0,
                reactor: ReactorConfig {
                    nodes: 400,
                    volume_m3: 5.0e-6 + 3.36e-6,
                    time_step_s: 0.005,
                    arrhenius_factor: 11.3,
                    activation_energy: 23_681.0,
                    molecular_weight: 346.0,
                    ..ReactorConfig::default()
                },
            },
            quench_temperature_c: 25.0,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct CascadeOverlay {
    primary: Option<serde_json::Value>,
    secondary: Option<serde_json::Value>,
    quench_temperature_c: Option<f64>,
}

/// Merge the fields present in `patch` onto `base`.
fn overlay_stage(base: &StageConfig, patch: serde_json::Value) -> serde_json::Result<StageConfig> {
    let mut merged = serde_json::to_value(base)?;
    match (merged.as_object_mut(), patch) {
        (Some(fields), serde_json::Value::Object(overrides)) => fields.extend(overrides),
        (_, other) => return serde_json::from_value(other),
    }
    serde_json::from_value(merged)
}

impl<'de> Deserialize<'de> for CascadeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let overlay = CascadeOverlay::deserialize(deserializer)?;
        let mut config = CascadeConfig::default();
        if let Some(patch) = overlay.primary {
            config.primary = overlay_stage(&config.primary, patch).map_err(D::Error::custom)?;
        }
        if let Some(patch) = overlay.secondary {
            config.secondary = overlay_stage(&config.secondary, patch).map_err(D::Error::custom)?;
        }
        if let Some(quench) = overlay.quench_temperature_c {
            config.quench_temperature_c = quench;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ReactorConfig::default().validate().unwrap();
        let cascade = CascadeConfig::default();
        cascade.primary.reactor.validate().unwrap();
        cascade.secondary.reactor.validate().unwrap();
    }

    #[test]
    fn too_few_nodes_rejected() {
        let cfg = ReactorConfig {
            nodes: 2,
            ..ReactorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ReactorError::InvalidArg { .. })));
    }

    #[test]
    fn non_finite_rejected() {
        let cfg = ReactorConfig {
            density: f64::NAN,
            ..ReactorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ReactorError::NonFinite { .. })));
    }

    #[test]
    fn derived_geometry_is_consistent() {
        let cfg = ReactorConfig::default();
        let g = ReactorGeometry::derive(&cfg).unwrap();
        assert!((g.area_m2 * g.length_m - cfg.volume_m3).abs() < 1e-18);
        assert!((g.dx_m * (cfg.nodes - 1) as f64 - g.length_m).abs() < 1e-12);
        let expected_h = 3.66 * 0.12 / 0.001_587_5;
        assert!((g.convective_coefficient - expected_h).abs() < 1e-9);
        // L/V = 1/A
        let expected_wall = expected_h * g.perimeter_m * cfg.time_step_s / (1750.0 * 1172.0) / g.area_m2;
        assert!((g.wall_exchange - expected_wall).abs() < 1e-15);
    }

    #[test]
    fn stability_numbers_scale_with_velocity() {
        let g = ReactorGeometry::derive(&ReactorConfig::default()).unwrap();
        let still = g.stability(0.0);
        assert_eq!(still.courant, 0.0);
        let moving = g.stability(0.01);
        assert!((moving.courant - 0.01 * g.dt_s / g.dx_m).abs() < 1e-15);
        assert_eq!(moving.dispersion, still.dispersion);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let cfg: ReactorConfig = serde_yaml::from_str("nodes: 120\ntime_step_s: 0.002\n").unwrap();
        assert_eq!(cfg.nodes, 120);
        assert_eq!(cfg.time_step_s, 0.002);
        assert_eq!(cfg.bootstrap_steps, 1000);
    }

    #[test]
    fn partial_stage_keeps_its_own_cascade_defaults() {
        let cfg: CascadeConfig =
            serde_yaml::from_str("primary:\n  nodes: 120\nsecondary:\n  stock_b: 900\n").unwrap();
        let defaults = CascadeConfig::default();

        assert_eq!(cfg.primary.reactor.nodes, 120);
        assert_eq!(cfg.primary.stock_a, 1200.0);
        assert_eq!(cfg.primary.stock_b, 1000.0);
        assert_eq!(cfg.primary.reactor.volume_m3, 10.0e-6);
        assert_eq!(cfg.primary.reactor.time_step_s, 0.005);

        assert_eq!(cfg.secondary.stock_b, 900.0);
        assert_eq!(cfg.secondary.reactor, defaults.secondary.reactor);
        assert_eq!(cfg.quench_temperature_c, 25.0);
    }

    #[test]
    fn cascade_yaml_round_trip() {
        let cfg = CascadeConfig::default();
        let text = serde_yaml::to_string(&cfg).unwrap();
        let back: CascadeConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn malformed_stage_is_rejected() {
        assert!(serde_yaml::from_str::<CascadeConfig>("primary:\n  nodes: many\n").is_err());
        assert!(serde_yaml::from_str::<CascadeConfig>("primary: 3\n").is_err());
    }
}
