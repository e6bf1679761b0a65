//! Cart line items and the product references they are built from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Price, ProductId, Quantity};

/// Product metadata supplied by the catalog when adding to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Catalog product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Product image URL.
    pub image_url: String,
    /// Unit price.
    pub price: Price,
}

impl ProductRef {
    /// Create a product reference.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

/// One line in the cart.
///
/// Field names match the persisted snapshot layout:
/// `{id, title, image_url, price, quantity}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: Quantity,
}

impl CartItem {
    /// Build a line from catalog metadata and a quantity.
    #[must_use]
    pub fn from_product(product: ProductRef, quantity: Quantity) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity,
        }
    }

    /// Copy of this line with a different quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: Quantity) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity.get())
    }
}
