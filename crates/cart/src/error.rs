//! Error types for the cart engine.

use thiserror::Error;

/// Errors raised by a [`KeyValueStorage`](crate::storage::KeyValueStorage) adapter.
///
/// Cloneable so a single write failure can be handed to every observer and
/// to any caller waiting on a flush.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The underlying medium could not be reached or refused the operation.
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// Adapter-specific description.
        reason: String,
    },
}

impl StorageError {
    /// Build an [`StorageError::Unavailable`] from any displayable cause.
    pub fn unavailable(reason: impl ToString) -> Self {
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::unavailable(err)
    }
}

/// Errors raised while decoding or encoding the persisted cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The value is not a JSON array of cart lines, or a line is invalid.
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Two lines share an ID.
    #[error("duplicate product id in cart snapshot: {0}")]
    DuplicateId(String),
}

/// Errors returned by [`CartService`](crate::CartService) operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    /// The service has shut down and no longer admits mutations.
    #[error("cart service is closed")]
    Closed,

    /// Writing the committed cart to storage failed.
    #[error("persistence failed for cart version {version}: {source}")]
    Storage {
        /// Commit version whose write failed.
        version: u64,
        /// Adapter error.
        source: StorageError,
    },
}
