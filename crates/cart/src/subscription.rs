//! Observer registry.
//!
//! Listeners are plain synchronous callbacks invoked after the event they
//! observe has happened. Registration returns a [`Subscription`] guard;
//! dropping it (or calling [`Subscription::unsubscribe`]) removes the listener.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::error;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A set of callbacks interested in values of type `T`.
pub(crate) struct Listeners<T> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Callback<T>)>>,
}

impl<T: 'static> Listeners<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            entries: RwLock::new(Vec::new()),
        })
    }

    /// Register `listener`; it stays registered while the returned guard lives.
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        let registry: Arc<dyn Unsubscribe> = Arc::clone(self) as Arc<dyn Unsubscribe>;
        Subscription {
            id,
            registry: Arc::downgrade(&registry),
        }
    }

    /// Invoke every listener with `value`, in registration order.
    ///
    /// The registry lock is released before any callback runs, so a listener
    /// may subscribe or unsubscribe from inside its own callback. A panicking
    /// listener is logged and skipped.
    pub(crate) fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                error!("Listener panicked; continuing with remaining listeners");
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

trait Unsubscribe: Send + Sync {
    fn remove(&self, id: u64);
}

impl<T: 'static> Unsubscribe for Listeners<T> {
    fn remove(&self, id: u64) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(entry, _)| *entry != id);
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unregisters the listener. Keep it alive for as long
/// as notifications are wanted.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Unsubscribe>,
}

impl Subscription {
    /// Stop receiving notifications.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Whether the registry this handle belongs to still exists.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
