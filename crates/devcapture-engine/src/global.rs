//! Optional process-wide engine
//!
//! For call sites that cannot be handed a [`DevCapture`]. There is at most
//! one current engine. [`init`] replaces it: the previous engine is
//! destroyed (timer stopped, interceptors released, buffers flushed) before
//! the new one is built, so the two never own the interceptors at once.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use devcapture_core::{TelemetryConfig, TelemetryError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::{DevCapture, DevCaptureBuilder};

static INSTANCE: Mutex<Option<DevCapture>> = Mutex::new(None);

/// Builds an engine from `config` and makes it the current one.
///
/// Any previous engine is destroyed first, even if building the new one
/// then fails; in that case no engine is current afterwards.
pub fn init(config: TelemetryConfig) -> Result<DevCapture, TelemetryError> {
    init_with(DevCapture::builder(config))
}

/// [`init`] with a customized builder.
pub fn init_with(builder: DevCaptureBuilder) -> Result<DevCapture, TelemetryError> {
    let mut current = INSTANCE.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(previous) = current.take() {
        previous.destroy();
        info!("Previous capture engine torn down");
    }

    let engine = builder.build()?;
    *current = Some(engine.clone());
    Ok(engine)
}

/// The current engine, if one was initialized and not shut down.
pub fn get() -> Option<DevCapture> {
    INSTANCE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Removes the current engine and shuts it down, waiting up to `grace`
/// for its delivery channel to drain.
pub async fn shutdown(grace: Duration) {
    let engine = INSTANCE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(engine) = engine {
        engine.shutdown(grace).await;
    }
}

/// Spawns a watcher that flushes whichever engine is current when `token`
/// is cancelled.
///
/// # Panics
/// Panics if called outside a tokio runtime.
pub fn flush_current_on(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        token.cancelled().await;
        if let Some(engine) = get() {
            engine.notify_unload();
        }
    })
}
