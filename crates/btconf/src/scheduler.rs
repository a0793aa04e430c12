//! Single-pending-timer scheduler backing the debounced flush.
//!
//! An [`Alarm`] holds at most one pending callback.  Arming it again replaces
//! the pending callback and restarts the delay, which is exactly what the
//! debounce needs: a burst of writes keeps pushing the flush back until the
//! writes stop for a full settle delay.
//!
//! # Execution context
//!
//! The alarm owns a small dedicated Tokio runtime.  Callbacks run on that
//! runtime's worker thread, never on the thread that armed the alarm, so a
//! callback may block on the cache lock without stalling the caller.
//! Accessor callers stay fully synchronous and never need a runtime of their
//! own.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::trace;

/// Error type for scheduler creation.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The timer runtime could not be started.
    #[error("failed to start alarm runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// A cancellable, re-armable one-shot timer.
pub struct Alarm {
    /// `Option` only so `Drop` can move the runtime out for a non-blocking
    /// shutdown.  Always `Some` while the alarm is alive.
    runtime: Option<Runtime>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Alarm {
    /// Starts the timer runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Runtime`] if the runtime thread cannot be
    /// spawned.
    pub fn new() -> Result<Self, SchedulerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("btconf-alarm")
            .enable_time()
            .build()
            .map_err(SchedulerError::Runtime)?;

        Ok(Self {
            runtime: Some(runtime),
            pending: Mutex::new(None),
        })
    }

    /// Arms the alarm to run `callback` after `delay`.
    ///
    /// Any callback that has not fired yet is cancelled first.
    pub fn set<F>(&self, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        let mut pending = self.pending();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        *pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        }));
        trace!("alarm armed for {delay:?}");
    }

    /// Cancels the pending callback, if any.
    ///
    /// Returns `true` if a callback was pending and had not finished.  A
    /// callback that is already running is allowed to complete.
    pub fn cancel(&self) -> bool {
        match self.pending().take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    /// Returns `true` while a callback is armed and has not finished.
    pub fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Alarm {
    fn drop(&mut self) {
        self.cancel();
        // `shutdown_background` does not block, so dropping the alarm is safe
        // from inside an async context and from the alarm's own worker.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
