//! Background worker threads with cooperative stop and bounded join.
//!
//! Every long-lived thread in the process (instrument pollers, the control
//! sampling cycle) observes a [`StopSignal`] at its loop boundary and is
//! joined with a deadline. A worker that misses the deadline is detached
//! so a slow thread never hangs shutdown.

use crate::error::{CoreError, CoreResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const STOP_POLL_SLICE: Duration = Duration::from_millis(20);

/// Shared, clonable stop request flag.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the observing thread(s) to stop. Idempotent.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the signal can guard another run.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Sleep for `duration` in short slices, returning early once a stop is
    /// requested. Returns `true` if the stop was observed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(STOP_POLL_SLICE));
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A named thread whose result is delivered over a channel so the owner can
/// wait for it with a timeout.
pub struct BoundedWorker<T> {
    name: String,
    stop: StopSignal,
    done_rx: Receiver<T>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> BoundedWorker<T> {
    /// Spawn `body` on a new named thread. `body` receives a clone of `stop`
    /// and should return once it observes a request.
    pub fn spawn<F>(name: impl Into<String>, stop: StopSignal, body: F) -> CoreResult<Self>
    where
        F: FnOnce(StopSignal) -> T + Send + 'static,
    {
        let name = name.into();
        let (done_tx, done_rx) = mpsc::channel();
        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let out = body(thread_stop);
                // Owner may have given up waiting already.
                let _ = done_tx.send(out);
            })
            .map_err(|source| CoreError::Spawn {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            stop,
            done_rx,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Request a stop and wait up to `timeout` for the worker's result.
    ///
    /// Returns `None` if the worker did not finish in time (it is detached)
    /// or if it panicked.
    pub fn shutdown(mut self, timeout: Duration) -> Option<T> {
        self.stop.request();
        self.wait(timeout)
    }

    /// Wait up to `timeout` for the worker to finish on its own.
    pub fn wait(&mut self, timeout: Duration) -> Option<T> {
        match self.done_rx.recv_timeout(timeout) {
            Ok(out) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                Some(out)
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    worker = %self.name,
                    timeout_s = timeout.as_secs_f64(),
                    "worker did not stop in time, detaching"
                );
                self.handle.take();
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!(worker = %self.name, "worker exited without a result");
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                None
            }
        }
    }
}
