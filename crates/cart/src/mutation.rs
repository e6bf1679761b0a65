//! Cart mutation algorithms.
//!
//! Pure functions over an item slice: no locking, no I/O, no awaiting. The
//! service runs them against the store's live state inside its single-writer
//! queue, so each one always sees the fully committed result of the previous.

use marketplace_core::{CartItem, ProductId, ProductRef, Quantity};

/// A requested change to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Add one unit of a product, refreshing its metadata if already present.
    Add(ProductRef),
    /// Add one unit to an existing line.
    Increment(ProductId),
    /// Remove one unit from an existing line, never going below one.
    Decrement(ProductId),
}

impl Mutation {
    /// Product the mutation targets.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        match self {
            Self::Add(product) => &product.id,
            Self::Increment(id) | Self::Decrement(id) => id,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Increment(_) => "increment",
            Self::Decrement(_) => "decrement",
        }
    }

    /// Whether this mutation would add a unit to a line already at
    /// [`Quantity::MAX`], so the quantity cannot grow.
    #[must_use]
    pub fn hits_quantity_cap(&self, items: &[CartItem]) -> bool {
        match self {
            Self::Add(_) | Self::Increment(_) => items
                .iter()
                .any(|item| &item.id == self.product_id() && item.quantity.is_max()),
            Self::Decrement(_) => false,
        }
    }

    /// Compute the next item list from `items`.
    ///
    /// Returns `None` when the result would be structurally identical to
    /// `items` (unknown ID, decrement at the floor, increment of a line at
    /// [`Quantity::MAX`] without new metadata).
    #[must_use]
    pub fn apply(&self, items: &[CartItem]) -> Option<Vec<CartItem>> {
        let next = match self {
            Self::Add(product) => add(items, product),
            Self::Increment(id) => adjust(items, id, Quantity::incremented),
            Self::Decrement(id) => adjust(items, id, Quantity::decremented),
        };
        (next.as_slice() != items).then_some(next)
    }
}

/// Existing line: take the new metadata and one more unit, in place.
/// New line: append with quantity one.
fn add(items: &[CartItem], product: &ProductRef) -> Vec<CartItem> {
    let mut next = items.to_vec();
    match next.iter_mut().find(|item| item.id == product.id) {
        Some(existing) => {
            *existing = CartItem::from_product(product.clone(), existing.quantity.incremented());
        }
        None => next.push(CartItem::from_product(product.clone(), Quantity::ONE)),
    }
    next
}

fn adjust(items: &[CartItem], id: &ProductId, step: fn(Quantity) -> Quantity) -> Vec<CartItem> {
    items
        .iter()
        .map(|item| {
            if &item.id == id {
                item.with_quantity(step(item.quantity))
            } else {
                item.clone()
            }
        })
        .collect()
}
