//! Periodic flush timer
//!
//! The [`FlushTimer`] drives the timer-triggered flush path. It ticks every
//! `period` (first tick one full period after start) and invokes its
//! callback unconditionally; the engine's flush is a no-op on empty buffers.
//!
//! ## Flow
//!
//! ```text
//! tokio::time::interval ──→ on_tick() ──→ DevCapture::flush (timer trigger)
//!          │
//!   CancellationToken (stop / drop)
//! ```

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Handle to a running periodic flush task.
///
/// The task stops when [`stop`](FlushTimer::stop) is called, when the
/// handle is dropped, or when the callback returns `false`.
pub struct FlushTimer {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl FlushTimer {
    /// Spawns the timer on `runtime`.
    ///
    /// # Arguments
    /// * `runtime` - Handle of the tokio runtime that owns the task
    /// * `period` - Time between ticks
    /// * `on_tick` - Called at each tick; return `false` to end the timer
    pub fn start<F>(runtime: &tokio::runtime::Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        info!(period_ms = period.as_millis() as u64, "Starting flush timer");

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Flush timer cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !on_tick() {
                            debug!("Flush timer owner gone, stopping");
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown, task }
    }

    /// Stops the timer. No new tick starts after this returns; a callback
    /// already running on another worker thread finishes normally.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Returns true once the timer task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for FlushTimer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
