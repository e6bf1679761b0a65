//! Core types for the marketplace cart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod item;
pub mod price;
pub mod quantity;

pub use id::ProductId;
pub use item::{CartItem, ProductRef};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
