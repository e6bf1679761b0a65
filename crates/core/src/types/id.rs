//! Product identifier used as the cart's line key.
//!
//! Catalog IDs arrive as opaque strings, so `ProductId` wraps a `String`
//! rather than a numeric database key.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a catalog product. Unique within a cart.
///
/// # Example
///
/// ```rust
/// use marketplace_core::ProductId;
///
/// let id = ProductId::new("sku-1");
/// assert_eq!(id.as_str(), "sku-1");
/// assert_eq!(id, ProductId::from("sku-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new ID from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for ProductId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProductId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
