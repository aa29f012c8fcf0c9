//! Filesystem-backed durable storage.
//!
//! Each key maps to one `<key>.dat` file under the base directory. Keys may
//! contain `/` to form subdirectories (`ads/interaction_count`). Writes go to a
//! sibling temp file first and are renamed into place, so a crash mid-write
//! leaves the previous value readable.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use vesper_core::effects::{StorageEffects, StorageError};

/// Filesystem-based storage handler for production use
#[derive(Debug, Clone)]
pub struct FilesystemStorageHandler {
    /// Base directory for storage files
    base_path: PathBuf,
}

impl FilesystemStorageHandler {
    /// Create a new filesystem storage handler rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Base directory of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                reason: "Key cannot be empty".to_string(),
            });
        }
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(StorageError::InvalidKey {
                reason: format!("Key must be a relative path without '..': {key}"),
            });
        }
        Ok(self.base_path.join(format!("{key}.dat")))
    }
}

#[async_trait]
impl StorageEffects for FilesystemStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let file_path = self.path_for(key)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::WriteFailed(format!("Failed to create directory: {e}"))
            })?;
        }

        let tmp_path = file_path.with_extension("dat.tmp");
        fs::write(&tmp_path, value)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to write file: {e}")))?;
        fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to replace file: {e}")))?;

        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let file_path = self.path_for(key)?;
        match fs::read(&file_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!(
                "Failed to read file: {e}"
            ))),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let file_path = self.path_for(key)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to remove file: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_retrieve_remove() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path());

        let key = "ads/interaction_count";
        handler.store(key, b"7".to_vec()).await.unwrap();
        assert_eq!(handler.retrieve(key).await.unwrap(), Some(b"7".to_vec()));
        assert!(temp_dir.path().join("ads/interaction_count.dat").exists());

        assert!(handler.remove(key).await.unwrap());
        assert!(!handler.remove(key).await.unwrap());
        assert_eq!(handler.retrieve(key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_a_new_handler() {
        let temp_dir = TempDir::new().unwrap();
        FilesystemStorageHandler::new(temp_dir.path())
            .store("ads/suppressed_until_ms", b"3600000".to_vec())
            .await
            .unwrap();

        let reopened = FilesystemStorageHandler::new(temp_dir.path());
        assert_eq!(
            reopened.retrieve("ads/suppressed_until_ms").await.unwrap(),
            Some(b"3600000".to_vec())
        );
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let temp_dir = TempDir::new().unwrap();
        let handler = FilesystemStorageHandler::new(temp_dir.path());

        for key in ["", "../outside", "/etc/passwd", "ads/../../x"] {
            let err = handler.store(key, Vec::new()).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey { .. }), "{key}");
        }
    }
}
