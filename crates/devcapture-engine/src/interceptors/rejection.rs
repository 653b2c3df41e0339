//! Unobserved task failure observation
//!
//! Detached tasks whose error nobody awaits are the Rust counterpart of an
//! unhandled rejection. [`spawn_observed`] detaches a fallible future and
//! reports its error; [`report_rejection`] records one directly.

use std::fmt::Display;
use std::future::Future;

use devcapture_core::DiagnosticEvent;
use tokio::task::JoinHandle;

use super::Slot;

pub(crate) static REJECTION_SLOT: Slot = Slot::new();

/// Records `reason` as an unhandled rejection with the engine owning the
/// rejection interceptor. Does nothing without an owner.
pub fn report_rejection(reason: impl Display) {
    if let Some(engine) = REJECTION_SLOT.current() {
        engine.capture_event(rejection_event(&reason));
    }
}

/// Spawns `future` as a detached task on the current runtime and reports
/// its error, if it resolves to one.
///
/// # Panics
/// Panics if called outside a tokio runtime, like `tokio::spawn`.
pub fn spawn_observed<F, T, E>(future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = future.await {
            report_rejection(e);
        }
    })
}

fn rejection_event(reason: &dyn Display) -> DiagnosticEvent {
    DiagnosticEvent::error(format!("Unhandled rejection: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message() {
        let event = rejection_event(&"connection reset");
        assert_eq!(event.message, "Unhandled rejection: connection reset");
        assert_eq!(event.level, devcapture_core::Level::Error);
    }

    #[tokio::test]
    async fn test_spawn_observed_completes_without_owner() {
        let handle = spawn_observed(async { Err::<(), _>("nobody listening") });
        handle.await.unwrap();
    }
}
