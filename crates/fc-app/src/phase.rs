use std::fmt;

/// Stages of one production run, in execution order. Transitions only move
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessPhase {
    /// Valve to waste before anything flows.
    Prime,
    /// Wait for the reactor temperature, then start the pumps.
    Warmup,
    /// Model-predictive diversion under a duration watchdog.
    SteadyStateRun,
    /// Pumps off, valve to waste.
    Shutdown,
    /// Reserved; does nothing yet.
    Purge,
}

impl ProcessPhase {
    pub const ALL: [ProcessPhase; 5] = [
        ProcessPhase::Prime,
        ProcessPhase::Warmup,
        ProcessPhase::SteadyStateRun,
        ProcessPhase::Shutdown,
        ProcessPhase::Purge,
    ];

    pub fn next(self) -> Option<ProcessPhase> {
        match self {
            ProcessPhase::Prime => Some(ProcessPhase::Warmup),
            ProcessPhase::Warmup => Some(ProcessPhase::SteadyStateRun),
            ProcessPhase::SteadyStateRun => Some(ProcessPhase::Shutdown),
            ProcessPhase::Shutdown => Some(ProcessPhase::Purge),
            ProcessPhase::Purge => None,
        }
    }
}

impl fmt::Display for ProcessPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessPhase::Prime => "prime",
            ProcessPhase::Warmup => "warmup",
            ProcessPhase::SteadyStateRun => "steady-state run",
            ProcessPhase::Shutdown => "shutdown",
            ProcessPhase::Purge => "purge",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_linear() {
        let mut walked = vec![ProcessPhase::Prime];
        while let Some(next) = walked.last().and_then(|p| p.next()) {
            assert!(next > *walked.last().unwrap());
            walked.push(next);
        }
        assert_eq!(walked, ProcessPhase::ALL);
    }
}
