//! Fixed-capacity moving average.

use crate::error::{ControlError, ControlResult};
use std::collections::VecDeque;

/// Moving average over the last `capacity` samples of a scalar stream.
///
/// A partially filled window averages only the samples it holds. Not
/// synchronized; drive each instance from a single owner.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingWindowFilter {
    capacity: usize,
    window: VecDeque<f64>,
    value: Option<f64>,
}

impl SlidingWindowFilter {
    /// Create an empty filter holding at most `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns error if `capacity` is zero.
    pub fn new(capacity: usize) -> ControlResult<Self> {
        if capacity == 0 {
            return Err(ControlError::InvalidArg {
                what: "filter capacity must be at least 1",
            });
        }
        Ok(Self {
            capacity,
            window: VecDeque::with_capacity(capacity + 1),
            value: None,
        })
    }

    /// Append a sample, evicting the oldest one once the window is full, and
    /// return the new mean.
    pub fn push(&mut self, sample: f64) -> f64 {
        self.window.push_back(sample);
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }
        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        self.value = Some(mean);
        mean
    }

    /// Last computed mean, `None` before the first push.
    pub fn current_value(&self) -> Option<f64> {
        self.value
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn partial_window_mean() {
        let mut f = SlidingWindowFilter::new(5).unwrap();
        assert_eq!(f.current_value(), None);
        f.push(1.0);
        f.push(2.0);
        let mean = f.push(3.0);
        assert_eq!(mean, 2.0);
        assert_eq!(f.current_value(), Some(2.0));
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn sixth_sample_evicts_oldest() {
        let mut f = SlidingWindowFilter::new(5).unwrap();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            f.push(v);
        }
        assert_eq!(f.current_value(), Some(3.0));
        let mean = f.push(6.0);
        assert_eq!(f.len(), 5);
        // window is now 2..=6
        assert_eq!(mean, 4.0);
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(SlidingWindowFilter::new(0).is_err());
    }

    #[test]
    fn clear_resets_value() {
        let mut f = SlidingWindowFilter::new(2).unwrap();
        f.push(4.0);
        f.clear();
        assert!(f.is_empty());
        assert_eq!(f.current_value(), None);
    }

    proptest! {
        #[test]
        fn window_never_exceeds_capacity(
            capacity in 1usize..16,
            samples in proptest::collection::vec(-1e3f64..1e3, 1..64),
        ) {
            let mut f = SlidingWindowFilter::new(capacity).unwrap();
            for (i, s) in samples.iter().enumerate() {
                f.push(*s);
                prop_assert_eq!(f.len(), (i + 1).min(capacity));
            }
        }

        #[test]
        fn mean_matches_tail_of_stream(
            capacity in 1usize..16,
            samples in proptest::collection::vec(-1e3f64..1e3, 1..64),
        ) {
            let mut f = SlidingWindowFilter::new(capacity).unwrap();
            let mut last = 0.0;
            for s in &samples {
                last = f.push(*s);
            }
            let tail = &samples[samples.len().saturating_sub(capacity)..];
            let expected = tail.iter().sum::<f64>() / tail.len() as f64;
            prop_assert!((last - expected).abs() < 1e-9);
        }
    }
}
