//! Synchronous multicast to a dynamic set of listeners.
//!
//! Delivery follows registration order. A listener that returns an error or
//! panics is logged and skipped; the remaining listeners still get the event.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::error;

/// Identity comparison for listener handles, ignoring vtable metadata.
pub fn same_listener<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn deliver_one<L: ?Sized>(
    listener: &L,
    event: &'static str,
    deliver: &mut impl FnMut(&L) -> anyhow::Result<()>,
) -> bool {
    match catch_unwind(AssertUnwindSafe(|| deliver(listener))) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!(event, error = %e, "listener failed");
            false
        }
        Err(_) => {
            error!(event, "listener panicked");
            false
        }
    }
}

pub struct Fanout<L: ?Sized> {
    listeners: Vec<Arc<L>>,
}

impl<L: ?Sized> Fanout<L> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Returns false when the listener was already registered.
    pub fn register(&mut self, listener: Arc<L>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub fn unregister(&mut self, listener: &Arc<L>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !same_listener(l, listener));
        before != self.listeners.len()
    }

    pub fn contains(&self, listener: &Arc<L>) -> bool {
        self.listeners.iter().any(|l| same_listener(l, listener))
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers to every listener and returns how many failed.
    pub fn emit(&self, event: &'static str, mut deliver: impl FnMut(&L) -> anyhow::Result<()>) -> usize {
        self.emit_skipping(event, &[], &mut deliver)
    }

    fn emit_skipping(
        &self,
        event: &'static str,
        skip: &[&Arc<L>],
        deliver: &mut impl FnMut(&L) -> anyhow::Result<()>,
    ) -> usize {
        let mut failures = 0;
        for listener in &self.listeners {
            if skip.iter().any(|s| same_listener(s, listener)) {
                continue;
            }
            if !deliver_one(listener.as_ref(), event, &mut *deliver) {
                failures += 1;
            }
        }
        failures
    }
}

impl<L: ?Sized> Default for Fanout<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan-out with two privileged slots that are always served first: the
/// primary display, then the master buzzer. Generic listeners follow, and a
/// listener occupying a privileged slot is never notified twice.
pub struct PrivilegedFanout<L: ?Sized> {
    primary: Option<Arc<L>>,
    buzzer: Option<Arc<L>>,
    others: Fanout<L>,
}

impl<L: ?Sized> PrivilegedFanout<L> {
    pub fn new() -> Self {
        Self {
            primary: None,
            buzzer: None,
            others: Fanout::new(),
        }
    }

    pub fn set_primary(&mut self, listener: Option<Arc<L>>) {
        self.primary = listener;
    }

    pub fn set_buzzer(&mut self, listener: Option<Arc<L>>) {
        self.buzzer = listener;
    }

    pub fn register(&mut self, listener: Arc<L>) -> bool {
        self.others.register(listener)
    }

    pub fn unregister(&mut self, listener: &Arc<L>) -> bool {
        self.others.unregister(listener)
    }

    pub fn emit(&self, event: &'static str, mut deliver: impl FnMut(&L) -> anyhow::Result<()>) -> usize {
        let mut failures = 0;
        let mut served: Vec<&Arc<L>> = Vec::with_capacity(2);
        for slot in [&self.primary, &self.buzzer].into_iter().flatten() {
            if served.iter().any(|s| same_listener(s, slot)) {
                continue;
            }
            if !deliver_one(slot.as_ref(), event, &mut deliver) {
                failures += 1;
            }
            served.push(slot);
        }
        failures + self.others.emit_skipping(event, &served, &mut deliver)
    }
}

impl<L: ?Sized> Default for PrivilegedFanout<L> {
    fn default() -> Self {
        Self::new()
    }
}
