//! Storage handler that fails every operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use vesper_core::effects::{StorageEffects, StorageError};

/// Storage whose reads and writes all fail. Counts the attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingStorage {
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl FailingStorage {
    /// Storage that fails every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads attempted so far.
    pub fn read_attempts(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Writes attempted so far.
    pub fn write_attempts(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageEffects for FailingStorage {
    async fn store(&self, key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::WriteFailed(format!("{key}: disk full")))
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::ReadFailed(format!("{key}: I/O error")))
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::DeleteFailed(format!("{key}: I/O error")))
    }

    async fn store_batch(&self, pairs: HashMap<String, Vec<u8>>) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::WriteFailed(format!(
            "batch of {}: disk full",
            pairs.len()
        )))
    }
}
