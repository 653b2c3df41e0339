//! ERROR-level log observation
//!
//! [`ErrorLogLayer`] is a `tracing_subscriber` layer. Stack it next to the
//! application's formatting layer: every ERROR event is recorded as an
//! `error` [`DiagnosticEvent`] and still reaches the other layers as usual.

use std::fmt::{self, Write as _};

use devcapture_core::DiagnosticEvent;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::Slot;

pub(crate) static LOG_SLOT: Slot = Slot::new();

/// Target prefixes whose events are never captured, so the capture
/// machinery cannot record its own output.
const IGNORED_TARGETS: &[&str] = &["devcapture_engine", "devcapture_core"];

/// Layer forwarding ERROR events to the engine owning the log interceptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorLogLayer {
    _private: (),
}

impl ErrorLogLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> Layer<S> for ErrorLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() != tracing::Level::ERROR {
            return;
        }
        if IGNORED_TARGETS
            .iter()
            .any(|prefix| metadata.target().starts_with(prefix))
        {
            return;
        }

        let Some(engine) = LOG_SLOT.current() else {
            return;
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        engine.capture_event(DiagnosticEvent::error(visitor.finish()));
    }
}

/// Joins the `message` field and every other field (`name=value`) with
/// single spaces.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        let mut parts = Vec::with_capacity(self.fields.len() + 1);
        if let Some(message) = self.message {
            parts.push(message);
        }
        parts.extend(self.fields);
        parts.join(" ")
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_str(field, &value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let mut rendered = String::new();
        // Writing into a String cannot fail.
        let _ = write!(rendered, "{value:?}");
        self.record_str(field, &rendered);
    }
}
