//! File-backed storage adapter.
//!
//! Each key maps to one file under a root directory. Writes go to a sibling
//! temp file which is then renamed over the target, so readers never see a
//! partially written value.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::KeyValueStorage;
use crate::error::StorageError;

/// Directory of key files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Use `root` as the storage directory. It is created on first write.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", escape_key(key)))
    }
}

impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");
        tokio::fs::write(&staging, value.as_bytes()).await?;
        tokio::fs::rename(&staging, &target).await?;

        debug!(path = %target.display(), bytes = value.len(), "Wrote storage file");
        Ok(())
    }
}

/// Map a key onto a portable file name.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`, so distinct keys never collide.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_key() {
        assert_eq!(escape_key("@GoMarketplace:products"), "%40GoMarketplace%3Aproducts");
        assert_eq!(escape_key("plain_key-1"), "plain_key-1");
        assert_ne!(escape_key("a:b"), escape_key("a_b"));
    }

    #[tokio::test]
    async fn test_absent_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        storage.set("@App:products", "[]".to_string()).await.unwrap();
        storage.set("@App:products", "[1]".to_string()).await.unwrap();

        assert_eq!(storage.get("@App:products").await.unwrap().as_deref(), Some("[1]"));
        assert!(storage.path_for("@App:products").exists());
        assert!(!storage.path_for("@App:products").with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_unreadable_root_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let storage = FileStorage::new(&blocker);
        let err = storage.set("k", "v".to_string()).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
