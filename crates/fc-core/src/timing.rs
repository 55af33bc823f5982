//! Opt-in tick timing.
//!
//! Measures how long the control loop spends inside each tick. Off unless
//! `FC_TIMING` is set in the environment or [`enable_timing`] was called.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var_os("FC_TIMING").is_some()
}

/// Stopwatch for a single tick.
pub struct Timer {
    start: Instant,
    enabled: bool,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Elapsed time, or `None` when timing is off.
    pub fn stop(self) -> Option<Duration> {
        self.enabled.then(|| self.start.elapsed())
    }
}

/// Running total of tick durations.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickStats {
    total: Duration,
    count: u64,
}

impl TickStats {
    pub const fn new() -> Self {
        Self {
            total: Duration::ZERO,
            count: 0,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.total = self.total.saturating_add(elapsed);
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean tick duration; `None` before the first record.
    pub fn average(&self) -> Option<Duration> {
        u32::try_from(self.count)
            .ok()
            .filter(|n| *n > 0)
            .map(|n| self.total / n)
    }

    /// Mean fraction of `period` spent ticking.
    pub fn load(&self, period: Duration) -> Option<f64> {
        let avg = self.average()?;
        (!period.is_zero()).then(|| avg.as_secs_f64() / period.as_secs_f64())
    }
}
