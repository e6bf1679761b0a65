//! In-memory storage adapter.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::KeyValueStorage;
use crate::error::StorageError;

/// Process-local key-value map.
///
/// Cheaply cloneable; clones share the same map, so a test can keep a handle
/// and inspect what the cart engine wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a single entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_absent_key() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("missing").await.unwrap(), None);
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let storage = MemoryStorage::new();
        storage.set("k", "a".to_string()).await.unwrap();
        storage.set("k", "b".to_string()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("b"));
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let storage = MemoryStorage::with_entry("k", "v");
        let handle = storage.clone();
        storage.set("other", "x".to_string()).await.unwrap();
        assert_eq!(handle.len().await, 2);
    }
}
