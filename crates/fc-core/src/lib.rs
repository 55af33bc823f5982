//! fc-core: stable foundation for flowcascade.
//!
//! Contains:
//! - units (uom SI types + constructors, lab-unit conversions)
//! - numeric (finite checks, zero-safe ratios)
//! - worker (stop signal + background threads joined with a deadline)
//! - timing (opt-in tick timing)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod timing;
pub mod units;
pub mod worker;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
pub use worker::{BoundedWorker, StopSignal, lock_or_recover};
