//! Discrete PID feedback controller.
//!
//! The controller integrates its own output: every update adds
//! `kp·e + ki·∫e + kd·de/dt` to the accumulated control value rather than
//! recomputing it from scratch. Time between updates is taken from the wall
//! clock, so the loop rate is whatever the measurement source delivers.
//!
//! Features:
//! - trapezoidal integral with optional symmetric clamp (anti-windup)
//! - manual override that bypasses the PID output but keeps it accumulating
//! - output callback, typically a pump speed setter

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Callback receiving the effective control value after each update.
pub type OutputSink = Box<dyn FnMut(f64) + Send>;

/// PID gains and integral clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Symmetric clamp on the integral accumulator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            integral_limit: None,
        }
    }
}

/// PID controller state and configuration.
pub struct FeedbackController {
    gains: PidGains,
    setpoint: f64,
    error: f64,
    integral: f64,
    derivative: f64,
    cv: f64,
    last_update: Option<Instant>,
    override_value: Option<f64>,
    output: Option<OutputSink>,
}

impl FeedbackController {
    /// Create a controller with the given gains and initial setpoint.
    ///
    /// # Errors
    ///
    /// Returns error if a gain is non-finite or the integral limit is negative.
    pub fn new(gains: PidGains, setpoint: f64) -> ControlResult<Self> {
        if !(gains.kp.is_finite() && gains.ki.is_finite() && gains.kd.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "gains must be finite",
            });
        }
        if let Some(limit) = gains.integral_limit {
            if !(limit.is_finite() && limit >= 0.0) {
                return Err(ControlError::InvalidArg {
                    what: "integral limit must be non-negative",
                });
            }
        }
        Ok(Self {
            gains,
            setpoint,
            error: 0.0,
            integral: 0.0,
            derivative: 0.0,
            cv: 0.0,
            last_update: None,
            override_value: None,
            output: None,
        })
    }

    /// Register the output callback.
    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = Some(output);
        self
    }

    pub fn set_output(&mut self, output: OutputSink) {
        self.output = Some(output);
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Change the setpoint. Resets the controller and clears any override.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
        self.override_value = None;
        self.reset();
    }

    /// Return error, integral, derivative, accumulated output and the time
    /// base to their initial state. The override is left untouched.
    pub fn reset(&mut self) {
        self.error = 0.0;
        self.integral = 0.0;
        self.derivative = 0.0;
        self.cv = 0.0;
        self.last_update = None;
    }

    pub fn override_value(&self) -> Option<f64> {
        self.override_value
    }

    /// Force the effective output to `value` (or release it with `None`).
    pub fn set_override(&mut self, value: Option<f64>) {
        self.override_value = value;
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn derivative(&self) -> f64 {
        self.derivative
    }

    pub fn p_term(&self) -> f64 {
        self.gains.kp * self.error
    }

    pub fn i_term(&self) -> f64 {
        self.gains.ki * self.integral
    }

    pub fn d_term(&self) -> f64 {
        self.gains.kd * self.derivative
    }

    /// Accumulated PID output, ignoring any override.
    pub fn accumulated_output(&self) -> f64 {
        self.cv
    }

    /// Output actually forwarded: the override if set, else the accumulated value.
    pub fn control_value(&self) -> f64 {
        self.override_value.unwrap_or(self.cv)
    }

    /// Feed a measurement taken now.
    pub fn update(&mut self, measurement: f64) -> f64 {
        self.update_at(measurement, Instant::now())
    }

    /// Feed a measurement taken at `now` and return the effective control value.
    pub fn update_at(&mut self, measurement: f64, now: Instant) -> f64 {
        let next_error = self.setpoint - measurement;

        if let Some(last) = self.last_update {
            let dt = now.saturating_duration_since(last).as_secs_f64();
            let delta_error = next_error - self.error;
            if dt > 0.0 {
                self.derivative = delta_error / dt;
                let integral = self.integral + dt * (self.error + 0.5 * delta_error);
                self.integral = match self.gains.integral_limit {
                    Some(limit) => integral.clamp(-limit, limit),
                    None => integral,
                };
            } else {
                self.derivative = 0.0;
            }
        }

        self.error = next_error;
        self.last_update = Some(now);
        self.cv += self.p_term() + self.i_term() + self.d_term();

        let effective = self.control_value();
        if let Some(output) = self.output.as_mut() {
            output(effective);
        }
        effective
    }
}

impl fmt::Debug for FeedbackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedbackController")
            .field("gains", &self.gains)
            .field("setpoint", &self.setpoint)
            .field("error", &self.error)
            .field("integral", &self.integral)
            .field("derivative", &self.derivative)
            .field("cv", &self.cv)
            .field("override_value", &self.override_value)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn gains(kp: f64, ki: f64, kd: f64) -> PidGains {
        PidGains {
            kp,
            ki,
            kd,
            integral_limit: None,
        }
    }

    #[test]
    fn first_update_is_proportional_only() {
        let mut pid = FeedbackController::new(gains(2.0, 1.0, 1.0), 10.0).unwrap();
        let out = pid.update_at(4.0, Instant::now());
        assert_eq!(pid.error(), 6.0);
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.derivative(), 0.0);
        assert_eq!(out, 12.0);
    }

    #[test]
    fn second_update_reproduces_pid_formula() {
        let (kp, ki, kd) = (0.4, 0.025, 0.25);
        let mut pid = FeedbackController::new(gains(kp, ki, kd), 3.0).unwrap();
        let t0 = Instant::now();
        pid.update_at(1.0, t0);
        let cv0 = pid.accumulated_output();
        assert_eq!(cv0, kp * 2.0);

        let dt = 0.5;
        let out = pid.update_at(2.0, t0 + Duration::from_millis(500));
        let e0 = 2.0;
        let e1 = 1.0;
        let derivative = (e1 - e0) / dt;
        let integral = dt * (e0 + 0.5 * (e1 - e0));
        let expected = cv0 + kp * e1 + ki * integral + kd * derivative;
        assert!((pid.derivative() - derivative).abs() < 1e-12);
        assert!((pid.integral() - integral).abs() < 1e-12);
        assert!((out - expected).abs() < 1e-12);
    }

    #[test]
    fn integral_clamped_symmetrically() {
        let g = PidGains {
            kp: 0.0,
            ki: 1.0,
            kd: 0.0,
            integral_limit: Some(0.5),
        };
        let mut pid = FeedbackController::new(g, 10.0).unwrap();
        let t0 = Instant::now();
        pid.update_at(0.0, t0);
        pid.update_at(0.0, t0 + Duration::from_secs(1));
        assert_eq!(pid.integral(), 0.5);

        pid.set_setpoint(-10.0);
        pid.update_at(0.0, t0);
        pid.update_at(0.0, t0 + Duration::from_secs(1));
        assert_eq!(pid.integral(), -0.5);
    }

    #[test]
    fn setpoint_change_resets_state_and_override() {
        let mut pid = FeedbackController::new(gains(1.0, 1.0, 1.0), 5.0).unwrap();
        let t0 = Instant::now();
        pid.update_at(1.0, t0);
        pid.update_at(2.0, t0 + Duration::from_secs(1));
        pid.set_override(Some(0.0));
        assert!(pid.integral() != 0.0);

        pid.set_setpoint(7.0);
        assert_eq!(pid.error(), 0.0);
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.derivative(), 0.0);
        assert_eq!(pid.accumulated_output(), 0.0);
        assert_eq!(pid.override_value(), None);

        // next call is treated as the first one again
        pid.update_at(7.0, t0 + Duration::from_secs(5));
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.derivative(), 0.0);
    }

    #[test]
    fn override_bypasses_output_but_accumulator_keeps_running() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut pid = FeedbackController::new(gains(1.0, 0.0, 0.0), 2.0)
            .unwrap()
            .with_output(Box::new(move |cv| sink.lock().unwrap().push(cv)));
        pid.set_override(Some(0.0));

        let out = pid.update_at(0.0, Instant::now());
        assert_eq!(out, 0.0);
        assert_eq!(pid.accumulated_output(), 2.0);

        pid.set_override(None);
        let out = pid.update_at(1.0, Instant::now());
        assert_eq!(out, 3.0);
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 3.0]);
    }

    #[test]
    fn zero_elapsed_time_leaves_integral_alone() {
        let mut pid = FeedbackController::new(gains(0.0, 1.0, 1.0), 1.0).unwrap();
        let t0 = Instant::now();
        pid.update_at(0.0, t0);
        pid.update_at(0.5, t0);
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.derivative(), 0.0);
    }

    #[test]
    fn invalid_gains_rejected() {
        assert!(FeedbackController::new(gains(f64::NAN, 0.0, 0.0), 0.0).is_err());
        let g = PidGains {
            integral_limit: Some(-1.0),
            ..PidGains::default()
        };
        assert!(FeedbackController::new(g, 0.0).is_err());
    }
}
