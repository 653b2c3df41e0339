//! Source interceptors
//!
//! Each interceptor kind observes one process-wide signal (HTTP calls made
//! through [`TracedClient`](network::TracedClient), ERROR-level `tracing`
//! events, panics, failed detached tasks) and forwards normalized records to
//! whichever engine currently owns that kind.
//!
//! Ownership lives in a [`Slot`]: a process-wide cell holding a weak
//! reference to the owning engine. Installing and uninstalling are
//! idempotent, and an engine can only clear a slot it still owns, so a
//! replacement engine never ends up observing the same signal twice.

pub mod log;
pub mod network;
pub mod panic;
pub mod rejection;

use std::sync::{Arc, PoisonError, RwLock, Weak};

use devcapture_core::CaptureToggles;
use tracing::debug;

use crate::engine::{DevCapture, Inner};

// ============================================================================
// Slot
// ============================================================================

/// Process-wide ownership cell for one interceptor kind.
pub(crate) struct Slot {
    owner: RwLock<Option<Weak<Inner>>>,
}

impl Slot {
    pub(crate) const fn new() -> Self {
        Self {
            owner: RwLock::new(None),
        }
    }

    /// Make `engine` the owner. Returns false if it already was.
    pub(crate) fn install(&self, engine: &Arc<Inner>) -> bool {
        let mut owner = self.owner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = owner.as_ref() {
            if current.as_ptr() == Arc::as_ptr(engine) {
                return false;
            }
            if current.strong_count() > 0 {
                debug!("Interceptor slot taken over from a live engine");
            }
        }
        *owner = Some(Arc::downgrade(engine));
        true
    }

    /// Clear the slot if `engine` owns it. Returns true if it did.
    pub(crate) fn uninstall(&self, engine: &Arc<Inner>) -> bool {
        let mut owner = self.owner.write().unwrap_or_else(PoisonError::into_inner);
        match owner.as_ref() {
            Some(current) if current.as_ptr() == Arc::as_ptr(engine) => {
                *owner = None;
                true
            }
            _ => false,
        }
    }

    /// The live owning engine, if any.
    pub(crate) fn current(&self) -> Option<DevCapture> {
        self.owner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
            .map(DevCapture::from_inner)
    }
}

// ============================================================================
// InterceptorKind
// ============================================================================

/// The observation sources an engine can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterceptorKind {
    /// HTTP calls made through `TracedClient` / `observe_call`
    Network,
    /// ERROR-level `tracing` events seen by `ErrorLogLayer`
    Log,
    /// Panics on any thread
    Panic,
    /// Errors from tasks started with `spawn_observed`
    Rejection,
}

impl InterceptorKind {
    pub const ALL: [InterceptorKind; 4] = [
        InterceptorKind::Network,
        InterceptorKind::Log,
        InterceptorKind::Panic,
        InterceptorKind::Rejection,
    ];

    fn slot(self) -> &'static Slot {
        match self {
            InterceptorKind::Network => &network::NETWORK_SLOT,
            InterceptorKind::Log => &log::LOG_SLOT,
            InterceptorKind::Panic => &panic::PANIC_SLOT,
            InterceptorKind::Rejection => &rejection::REJECTION_SLOT,
        }
    }

    /// Returns true if a live engine currently owns this kind.
    pub fn is_installed(self) -> bool {
        self.slot().current().is_some()
    }

    /// The engine currently owning this kind, if any.
    pub fn owner(self) -> Option<DevCapture> {
        self.slot().current()
    }

    fn enabled_in(self, toggles: &CaptureToggles) -> bool {
        match self {
            InterceptorKind::Network => toggles.network,
            InterceptorKind::Log => toggles.logs,
            InterceptorKind::Panic => toggles.panics,
            InterceptorKind::Rejection => toggles.rejections,
        }
    }
}

impl std::fmt::Display for InterceptorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InterceptorKind::Network => "network",
            InterceptorKind::Log => "log",
            InterceptorKind::Panic => "panic",
            InterceptorKind::Rejection => "rejection",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Interceptors
// ============================================================================

/// The set of interceptor kinds one engine installs.
#[derive(Debug, Clone, Default)]
pub(crate) struct Interceptors {
    kinds: Vec<InterceptorKind>,
}

impl Interceptors {
    /// Kinds enabled by `toggles`.
    pub(crate) fn from_toggles(toggles: &CaptureToggles) -> Self {
        Self {
            kinds: InterceptorKind::ALL
                .into_iter()
                .filter(|kind| kind.enabled_in(toggles))
                .collect(),
        }
    }

    /// An empty set; installs nothing.
    pub(crate) fn none() -> Self {
        Self::default()
    }

    pub(crate) fn install(&self, engine: &Arc<Inner>) {
        for kind in &self.kinds {
            if *kind == InterceptorKind::Panic {
                panic::ensure_hook_installed();
            }
            if kind.slot().install(engine) {
                debug!(kind = %kind, "Interceptor installed");
            }
        }
    }

    pub(crate) fn uninstall(&self, engine: &Arc<Inner>) {
        for kind in &self.kinds {
            if kind.slot().uninstall(engine) {
                debug!(kind = %kind, "Interceptor uninstalled");
            }
        }
    }
}
