//! Persisted cart representation.
//!
//! The snapshot is a JSON array of line objects in cart order:
//!
//! ```json
//! [{"id":"1","title":"Shirt","image_url":"https://...","price":10.0,"quantity":2}]
//! ```

use std::collections::HashSet;

use marketplace_core::CartItem;

use crate::error::SnapshotError;

/// Serialize cart lines for storage.
///
/// # Errors
///
/// Returns [`SnapshotError::Malformed`] if serialization fails, which only
/// happens if a price cannot be represented as a JSON number.
pub fn encode(items: &[CartItem]) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(items)?)
}

/// Parse a stored snapshot.
///
/// # Errors
///
/// Returns [`SnapshotError::Malformed`] for invalid JSON, a wrong shape, a
/// zero quantity or a negative price, and [`SnapshotError::DuplicateId`] if
/// two lines share an ID.
pub fn decode(raw: &str) -> Result<Vec<CartItem>, SnapshotError> {
    let items: Vec<CartItem> = serde_json::from_str(raw)?;

    let mut seen = HashSet::with_capacity(items.len());
    for item in &items {
        if !seen.insert(item.id.as_str()) {
            return Err(SnapshotError::DuplicateId(item.id.to_string()));
        }
    }

    Ok(items)
}
