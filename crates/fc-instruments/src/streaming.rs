//! Background-polled instruments.
//!
//! A [`StreamingInstrument`] owns one thread that repeatedly pulls from a
//! [`SampleSource`], optionally smooths the sample, and publishes it. Read
//! errors are logged and the previous value is kept.

use crate::error::InstrumentResult;
use crate::reading::ReadingCell;
use crate::traits::{Instrument, OperatingRange, Subscriber};
use fc_controls::SlidingWindowFilter;
use fc_core::{BoundedWorker, StopSignal, lock_or_recover};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Where a streaming instrument gets its raw samples.
pub trait SampleSource: Send + 'static {
    /// Next raw sample, or `Ok(None)` if nothing new is available yet.
    fn next_sample(&mut self) -> InstrumentResult<Option<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamingOptions {
    /// Pause between polls.
    pub poll_interval: Duration,
    /// Moving-average window applied before publishing; `None` publishes raw.
    pub smoothing_window: Option<usize>,
    /// How long close-on-drop waits for the reader thread.
    pub join_timeout: Duration,
    pub range: Option<OperatingRange>,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            smoothing_window: None,
            join_timeout: Duration::from_secs(10),
            range: None,
        }
    }
}

impl StreamingOptions {
    /// Flow meter defaults: 100 ms polling, 12-sample smoothing.
    pub fn flow_meter() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            smoothing_window: Some(12),
            ..Self::default()
        }
    }

    /// Temperature probe defaults: 1 s polling, raw values.
    pub fn temperature_probe() -> Self {
        Self::default()
    }
}

pub struct StreamingInstrument {
    name: String,
    cell: Arc<ReadingCell>,
    stop: StopSignal,
    worker: Mutex<Option<BoundedWorker<()>>>,
    join_timeout: Duration,
}

impl StreamingInstrument {
    pub fn spawn<S: SampleSource>(
        name: impl Into<String>,
        mut source: S,
        options: StreamingOptions,
    ) -> InstrumentResult<Self> {
        let name = name.into();
        let cell = Arc::new(ReadingCell::new());
        cell.set_range(options.range);
        let mut filter = options
            .smoothing_window
            .map(SlidingWindowFilter::new)
            .transpose()?;

        let stop = StopSignal::new();
        let thread_cell = Arc::clone(&cell);
        let thread_name = name.clone();
        let poll = options.poll_interval;
        let worker = BoundedWorker::spawn(format!("{name}-reader"), stop.clone(), move |stop| {
            tracing::debug!(instrument = %thread_name, "reader started");
            while !stop.is_requested() {
                match source.next_sample() {
                    Ok(Some(raw)) => {
                        let value = match filter.as_mut() {
                            Some(f) => f.push(raw),
                            None => raw,
                        };
                        thread_cell.publish(value);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(instrument = %thread_name, error = %err, "read failed, keeping last value");
                    }
                }
                if stop.sleep(poll) {
                    break;
                }
            }
            tracing::debug!(instrument = %thread_name, "reader stopped");
        })?;

        Ok(Self {
            name,
            cell,
            stop,
            worker: Mutex::new(Some(worker)),
            join_timeout: options.join_timeout,
        })
    }

    /// Close and wait (bounded) for the reader thread to exit.
    pub fn join(&self) {
        self.stop.request();
        if let Some(worker) = lock_or_recover(&self.worker).take() {
            worker.shutdown(self.join_timeout);
        }
    }
}

impl Instrument for StreamingInstrument {
    fn name(&self) -> &str {
        &self.name
    }

    fn current_value(&self) -> Option<f64> {
        self.cell.latest()
    }

    fn subscribe(&self, subscriber: Subscriber) {
        self.cell.subscribe(subscriber);
    }

    fn operating_range(&self) -> Option<OperatingRange> {
        self.cell.range()
    }

    fn set_operating_range(&self, range: Option<OperatingRange>) {
        self.cell.set_range(range);
    }

    fn close(&self) {
        self.stop.request();
    }
}

impl Drop for StreamingInstrument {
    fn drop(&mut self) {
        self.join();
    }
}

impl std::fmt::Debug for StreamingInstrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingInstrument")
            .field("name", &self.name)
            .field("cell", &self.cell)
            .field("closed", &self.stop.is_requested())
            .finish()
    }
}
