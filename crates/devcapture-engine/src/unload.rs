//! Unload notification
//!
//! Termination is signalled through a `CancellationToken`: whoever learns
//! the process is going away cancels it, and every watcher registered with
//! [`flush_on_cancel`] flushes its engine. [`shutdown_signal`] cancels a
//! token on SIGINT or SIGTERM. Neither is guaranteed to run on every kind
//! of termination; a hard kill skips both.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::DevCapture;

/// Spawns a watcher that flushes `engine` once `token` is cancelled.
///
/// The watcher does not keep the engine alive. It exits without flushing
/// if the engine is gone by then.
///
/// # Panics
/// Panics if called outside a tokio runtime.
pub fn flush_on_cancel(engine: &DevCapture, token: CancellationToken) -> JoinHandle<()> {
    let engine = engine.downgrade();
    tokio::spawn(async move {
        token.cancelled().await;
        if let Some(inner) = engine.upgrade() {
            DevCapture::from_inner(inner).notify_unload();
        }
    })
}

/// Waits for SIGTERM or SIGINT and cancels `token`.
///
/// A signal that cannot be listened for is logged and ignored; the other
/// one still works.
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
