//! Signal conditioning and feedback control for flowcascade.
//!
//! # Architecture
//!
//! - [`SlidingWindowFilter`] smooths one scalar sensor channel with a fixed-size
//!   moving average. Each instance belongs to exactly one call path.
//! - [`FeedbackController`] is a discrete, wall-clock driven PID with an
//!   integral clamp and a manual override, pushing its output through a callback
//!   (typically a pump speed setter).
//! - [`SampleConfig`] describes the fixed period of a polling or control loop.

pub mod controller;
pub mod error;
pub mod filter;
pub mod sampled;

pub use controller::{FeedbackController, OutputSink, PidGains};
pub use error::{ControlError, ControlResult};
pub use filter::SlidingWindowFilter;
pub use sampled::SampleConfig;
