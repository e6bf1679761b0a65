//! Key-value persistence adapters.
//!
//! The cart engine only needs two operations from its storage medium:
//! read a string value by key and atomically overwrite it. Anything that can
//! do that (a mobile key-value store, a file, a map) implements
//! [`KeyValueStorage`].
//!
//! # Adapters
//!
//! - [`MemoryStorage`] - process-local map, for tests and ephemeral carts
//! - [`FileStorage`] - one file per key, atomic replace on write
//! - [`StorageBackend`] - whichever of the above `CartConfig` selects

mod file;
mod memory;

use std::future::Future;
use std::sync::Arc;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

/// Opaque async key-value storage.
///
/// `set` must be atomic from the caller's perspective: a concurrent or later
/// `get` observes either the previous value or the new one, never a mix.
pub trait KeyValueStorage: Send + Sync + 'static {
    /// Read the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: String)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<S: KeyValueStorage> KeyValueStorage for Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).set(key, value)
    }
}

/// Storage adapter chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Memory(MemoryStorage),
    File(FileStorage),
}

impl KeyValueStorage for StorageBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Memory(storage) => storage.get(key).await,
            Self::File(storage) => storage.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        match self {
            Self::Memory(storage) => storage.set(key, value).await,
            Self::File(storage) => storage.set(key, value).await,
        }
    }
}
