//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_NAMESPACE` - Storage key namespace (default: `@GoMarketplace`)
//! - `CART_STORAGE_DIR` - Directory for file-backed storage. When unset the
//!   cart is kept in process memory only.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::{FileStorage, MemoryStorage, StorageBackend};

/// Namespace used when `CART_NAMESPACE` is not set.
pub const DEFAULT_NAMESPACE: &str = "@GoMarketplace";

/// Suffix appended to the namespace to form the cart's storage key.
const PRODUCTS_SUFFIX: &str = "products";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Application namespace prefixed to the storage key
    pub namespace: String,
    /// Directory for file-backed storage (`None` = in-memory)
    pub storage_dir: Option<PathBuf>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            storage_dir: None,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let namespace = lookup("CART_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        validate_namespace(&namespace)?;

        let storage_dir = lookup("CART_STORAGE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            namespace,
            storage_dir,
        })
    }

    /// The fixed key the cart snapshot is stored under, e.g. `@GoMarketplace:products`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}:{PRODUCTS_SUFFIX}", self.namespace)
    }

    /// Open the storage adapter this configuration selects.
    #[must_use]
    pub fn open_storage(&self) -> StorageBackend {
        match &self.storage_dir {
            Some(dir) => StorageBackend::File(FileStorage::new(dir)),
            None => StorageBackend::Memory(MemoryStorage::new()),
        }
    }
}

/// Namespaces are non-empty and must not contain the key separator.
fn validate_namespace(namespace: &str) -> Result<(), ConfigError> {
    if namespace.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "CART_NAMESPACE".to_string(),
            "must not be empty".to_string(),
        ));
    }
    if namespace.contains(':') {
        return Err(ConfigError::InvalidEnvVar(
            "CART_NAMESPACE".to_string(),
            "must not contain ':'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CartConfig::default());
        assert_eq!(config.storage_key(), "@GoMarketplace:products");
    }

    #[test]
    fn test_custom_namespace_and_dir() {
        let config = CartConfig::from_lookup(lookup_from(&[
            ("CART_NAMESPACE", "@Shop"),
            ("CART_STORAGE_DIR", "/var/lib/shop"),
        ]))
        .unwrap();
        assert_eq!(config.storage_key(), "@Shop:products");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/var/lib/shop")));
    }

    #[test]
    fn test_blank_storage_dir_means_memory() {
        let config = CartConfig::from_lookup(lookup_from(&[("CART_STORAGE_DIR", "  ")])).unwrap();
        assert!(config.storage_dir.is_none());
        assert!(matches!(config.open_storage(), StorageBackend::Memory(_)));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let err = CartConfig::from_lookup(lookup_from(&[("CART_NAMESPACE", "")])).unwrap_err();
        assert!(err.to_string().contains("CART_NAMESPACE"));
    }

    #[test]
    fn test_namespace_with_separator_rejected() {
        assert!(CartConfig::from_lookup(lookup_from(&[("CART_NAMESPACE", "a:b")])).is_err());
    }
}
