//! Line-item quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// A line in the cart always holds at least one unit.
    #[error("quantity must be at least 1")]
    Zero,
}

/// Number of units on a cart line.
///
/// ## Constraints
///
/// - Never less than 1. Decrementing floors at 1 instead of removing the line.
/// - Incrementing saturates at `u32::MAX`.
///
/// ## Examples
///
/// ```
/// use marketplace_core::Quantity;
///
/// let one = Quantity::ONE;
/// assert_eq!(one.incremented().get(), 2);
/// assert_eq!(one.decremented(), one);
///
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// The largest quantity a line can hold.
    pub const MAX: Self = Self(NonZeroU32::MAX);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] for `0`.
    pub const fn new(n: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(n) {
            Some(n) => Ok(Self(n)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Returns the raw count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit, saturating at [`Quantity::MAX`].
    #[must_use]
    pub const fn incremented(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Whether another increment would be absorbed by the cap.
    #[must_use]
    pub const fn is_max(self) -> bool {
        self.0.get() == u32::MAX
    }

    /// One fewer unit, but never below 1.
    #[must_use]
    pub const fn decremented(self) -> Self {
        match NonZeroU32::new(self.0.get() - 1) {
            Some(n) => Self(n),
            None => self,
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}
