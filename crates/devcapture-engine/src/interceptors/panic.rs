//! Panic observation
//!
//! A process-wide panic hook, installed once and chained in front of the
//! hook that was active at the time. It records the panic message and
//! source location with the engine owning the panic interceptor, then flushes
//! what is buffered, then hands over to the previous hook. The panic itself
//! proceeds unchanged.

use std::sync::Once;

use devcapture_core::DiagnosticEvent;

use super::Slot;
use crate::buffer::CriticalSection;
use crate::engine::FlushTrigger;

pub(crate) static PANIC_SLOT: Slot = Slot::new();

static HOOK: Once = Once::new();

/// Source location of a panic.
struct Location {
    file: String,
    line: u32,
    column: u32,
}

/// Installs the chained hook the first time it is called.
///
/// Later calls do nothing. The hook stays installed for the life of the
/// process; it is inert while no engine owns the panic slot.
pub(crate) fn ensure_hook_installed() {
    HOOK.call_once(|| {
        let previous_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |panic_info| {
            let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            let location = panic_info.location().map(|l| Location {
                file: l.file().to_string(),
                line: l.line(),
                column: l.column(),
            });

            capture_panic(message, location);
            previous_hook(panic_info);
        }));
    });
}

fn capture_panic(message: String, location: Option<Location>) {
    // A panic raised while this thread holds the buffer lock must not try
    // to take it again.
    if CriticalSection::is_active() {
        return;
    }
    let Some(engine) = PANIC_SLOT.current() else {
        return;
    };

    engine.capture_event(panic_event(message, location));
    engine.flush_with(FlushTrigger::Crash);
}

fn panic_event(message: String, location: Option<Location>) -> DiagnosticEvent {
    let event = DiagnosticEvent::error(message);
    match location {
        Some(location) => event
            .with_context("filename", location.file)
            .with_context("lineno", location.line)
            .with_context("colno", location.column),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_event_carries_location() {
        let event = panic_event(
            "index out of bounds".to_string(),
            Some(Location {
                file: "src/main.rs".to_string(),
                line: 12,
                column: 5,
            }),
        );

        assert_eq!(event.level, devcapture_core::Level::Error);
        assert_eq!(event.message, "index out of bounds");
        let context = event.context.unwrap();
        assert_eq!(context["filename"], "src/main.rs");
        assert_eq!(context["lineno"], 12);
        assert_eq!(context["colno"], 5);
    }

    #[test]
    fn test_panic_event_without_location() {
        let event = panic_event("boom".to_string(), None);
        assert!(event.context.is_none());
    }
}
