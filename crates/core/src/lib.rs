//! Marketplace Core - Shared cart domain types.
//!
//! This crate provides the types shared by every marketplace component:
//! - `marketplace-cart` - Cart state synchronization engine
//! - host applications that render the cart or feed it products
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, quantities, and cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
