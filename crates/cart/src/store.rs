//! Authoritative in-memory cart.
//!
//! `CartStore` holds the one live copy of the cart. Reads are side-effect
//! free and return a shared snapshot; the only mutator is [`CartStore::replace`],
//! which is crate-private so that every write goes through the service's
//! mutation queue.

use std::sync::{Arc, PoisonError, RwLock};

use marketplace_core::CartItem;
use tracing::{debug, warn};

use crate::codec;
use crate::state::CartState;

/// Holder of the current cart state.
#[derive(Debug, Default)]
pub struct CartStore {
    state: RwLock<CartState>,
}

impl CartStore {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Hydrate from a persisted snapshot.
    ///
    /// An absent snapshot yields an empty cart. A snapshot that fails to
    /// decode also yields an empty cart and logs a warning; loading never
    /// fails.
    #[must_use]
    pub fn load(persisted: Option<&str>) -> Self {
        let Some(raw) = persisted else {
            debug!("No persisted cart, starting empty");
            return Self::empty();
        };

        match codec::decode(raw) {
            Ok(items) => {
                debug!(lines = items.len(), "Restored persisted cart");
                Self {
                    state: RwLock::new(CartState::new(0, items)),
                }
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cart snapshot, starting empty");
                Self::empty()
            }
        }
    }

    /// The live item list, oldest line first.
    #[must_use]
    pub fn current_items(&self) -> Arc<[CartItem]> {
        self.read().shared_items()
    }

    /// The live state including its commit version.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.read().clone()
    }

    /// Swap in a new item list as the next version and return it.
    pub(crate) fn replace(&self, items: Vec<CartItem>) -> CartState {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let next = CartState::new(guard.version() + 1, items);
        *guard = next.clone();
        next
    }

    // A writer never panics while holding the lock (replace only assigns),
    // so a poisoned lock still guards a consistent value.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{Price, ProductRef, Quantity};

    use super::*;

    fn item(id: &str) -> CartItem {
        CartItem::from_product(
            ProductRef::new(id, "Thing", "u", Price::from_cents(100)),
            Quantity::ONE,
        )
    }

    #[test]
    fn test_load_absent_is_empty() {
        let store = CartStore::load(None);
        assert!(store.current_items().is_empty());
        assert_eq!(store.state().version(), 0);
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let store = CartStore::load(Some("definitely not json"));
        assert!(store.current_items().is_empty());
    }

    #[test]
    fn test_load_valid_snapshot() {
        let raw = codec::encode(&[item("a"), item("b")]).unwrap();
        let store = CartStore::load(Some(&raw));
        let ids: Vec<_> = store.current_items().iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_replace_bumps_version() {
        let store = CartStore::empty();
        let first = store.replace(vec![item("a")]);
        let second = store.replace(vec![item("a"), item("b")]);

        assert_eq!(first.version(), 1);
        assert_eq!(second.version(), 2);
        assert_eq!(store.state(), second);
        assert_eq!(store.current_items().len(), 2);
    }

    #[test]
    fn test_readers_keep_old_snapshot() {
        let store = CartStore::empty();
        let before = store.current_items();
        store.replace(vec![item("a")]);
        assert!(before.is_empty());
        assert_eq!(store.current_items().len(), 1);
    }
}
