//! Latest-value cell shared between an instrument's reader thread and its
//! consumers.

use crate::traits::{OperatingRange, Subscriber};
use fc_core::lock_or_recover;
use std::sync::Mutex;

/// Last-write-visible reading plus subscribers and operating range.
#[derive(Default)]
pub struct ReadingCell {
    latest: Mutex<Option<f64>>,
    range: Mutex<Option<OperatingRange>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ReadingCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<f64> {
        *lock_or_recover(&self.latest)
    }

    /// Store `value` and notify subscribers on the calling thread.
    pub fn publish(&self, value: f64) {
        *lock_or_recover(&self.latest) = Some(value);
        let mut subscribers = lock_or_recover(&self.subscribers);
        for subscriber in subscribers.iter_mut() {
            subscriber(value);
        }
    }

    pub fn subscribe(&self, subscriber: Subscriber) {
        lock_or_recover(&self.subscribers).push(subscriber);
    }

    pub fn range(&self) -> Option<OperatingRange> {
        *lock_or_recover(&self.range)
    }

    pub fn set_range(&self, range: Option<OperatingRange>) {
        *lock_or_recover(&self.range) = range;
    }
}

impl std::fmt::Debug for ReadingCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingCell")
            .field("latest", &self.latest())
            .field("range", &self.range())
            .field("subscribers", &lock_or_recover(&self.subscribers).len())
            .finish()
    }
}
