//! Record buffers awaiting delivery
//!
//! Two ordered streams (network spans, diagnostic events) bounded by the
//! same per-stream threshold. A drain empties both at once and hands the
//! records over in capture order.

use std::cell::Cell;

use devcapture_core::{DiagnosticEvent, NetworkSpan, Payload};

/// Pair of capture-ordered record streams.
#[derive(Debug)]
pub struct RecordBuffer {
    network: Vec<NetworkSpan>,
    events: Vec<DiagnosticEvent>,
    max_batch_size: usize,
}

impl RecordBuffer {
    /// Creates empty buffers that report "full" at `max_batch_size` records per stream.
    pub fn new(max_batch_size: usize) -> Self {
        Self {
            network: Vec::new(),
            events: Vec::new(),
            max_batch_size: max_batch_size.max(1),
        }
    }

    /// Append a span. Returns true when the network stream reached the threshold.
    pub fn push_network(&mut self, span: NetworkSpan) -> bool {
        self.network.push(span);
        self.network.len() >= self.max_batch_size
    }

    /// Append an event. Returns true when the event stream reached the threshold.
    pub fn push_event(&mut self, event: DiagnosticEvent) -> bool {
        self.events.push(event);
        self.events.len() >= self.max_batch_size
    }

    /// Remove everything buffered, or `None` if both streams are empty.
    pub fn drain(&mut self) -> Option<Payload> {
        if self.is_empty() {
            return None;
        }
        Some(Payload {
            network: std::mem::take(&mut self.network),
            events: std::mem::take(&mut self.events),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.network.is_empty() && self.events.is_empty()
    }

    /// Buffered `(spans, events)` counts.
    pub fn len(&self) -> (usize, usize) {
        (self.network.len(), self.events.len())
    }
}

// ============================================================================
// Critical-section marker
// ============================================================================

thread_local! {
    static IN_CRITICAL_SECTION: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as holding the buffer lock.
///
/// The panic hook consults this so that a panic raised while the lock is
/// held never tries to take it again on the same thread.
pub(crate) struct CriticalSection {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl CriticalSection {
    pub(crate) fn enter() -> Self {
        IN_CRITICAL_SECTION.with(|flag| flag.set(true));
        Self {
            _not_send: std::marker::PhantomData,
        }
    }

    /// True if the current thread is inside a buffer critical section.
    pub(crate) fn is_active() -> bool {
        IN_CRITICAL_SECTION.with(Cell::get)
    }
}

impl Drop for CriticalSection {
    fn drop(&mut self) {
        IN_CRITICAL_SECTION.with(|flag| flag.set(false));
    }
}
