//! Committed cart state as seen by readers and listeners.

use std::sync::Arc;

use marketplace_core::{CartItem, ProductId};
use rust_decimal::Decimal;

/// An immutable, versioned view of the cart.
///
/// Cloning is cheap: the item list is shared. Version `0` is the state
/// hydrated from storage at startup; every committed mutation bumps it by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartState {
    version: u64,
    items: Arc<[CartItem]>,
}

impl CartState {
    pub(crate) fn new(version: u64, items: Vec<CartItem>) -> Self {
        Self {
            version,
            items: items.into(),
        }
    }

    /// Empty cart at version 0.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    /// Commit counter.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Lines in insertion order, oldest first.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Shared handle to the line list.
    #[must_use]
    pub fn shared_items(&self) -> Arc<[CartItem]> {
        Arc::clone(&self.items)
    }

    /// Look up a line by product ID.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities (the badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{Price, ProductRef, Quantity};

    use super::*;

    #[test]
    fn test_totals() {
        let state = CartState::new(
            4,
            vec![
                CartItem::from_product(
                    ProductRef::new("1", "Shirt", "u", Price::from_cents(1000)),
                    Quantity::new(2).unwrap(),
                ),
                CartItem::from_product(
                    ProductRef::new("2", "Mug", "u", Price::from_cents(550)),
                    Quantity::ONE,
                ),
            ],
        );

        assert_eq!(state.version(), 4);
        assert_eq!(state.len(), 2);
        assert_eq!(state.total_quantity(), 3);
        assert_eq!(state.subtotal(), Decimal::new(2550, 2));
        assert_eq!(state.get(&ProductId::from("2")).unwrap().title, "Mug");
        assert!(state.get(&ProductId::from("3")).is_none());
    }

    #[test]
    fn test_empty() {
        let state = CartState::default();
        assert!(state.is_empty());
        assert_eq!(state.version(), 0);
        assert_eq!(state.subtotal(), Decimal::ZERO);
    }
}
