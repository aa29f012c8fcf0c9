//! Persisted policy state.
//!
//! Every value is stored as UTF-8 decimal text under a private key. Reads
//! never fail: a missing, unreadable or corrupt value is the zero value, so a
//! broken store degrades to "fresh install" instead of blocking the policy.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vesper_core::effects::{StorageEffects, StorageError};
use vesper_core::PhysicalTime;

/// Storage keys owned by the policy.
pub mod keys {
    /// Counted interactions since the last interstitial trigger
    pub const INTERACTION_COUNT: &str = "ads/interaction_count";
    /// Timestamp of the last counted interaction
    pub const LAST_INTERACTION_MS: &str = "ads/last_interaction_ms";
    /// Timestamp of the last displayed launch ad
    pub const LAUNCH_LAST_SHOWN_MS: &str = "ads/launch_last_shown_ms";
    /// End of the suppression window, `0` when inactive
    pub const SUPPRESSED_UNTIL_MS: &str = "ads/suppressed_until_ms";
    /// Set once the store review prompt has been attempted
    pub const REVIEW_PROMPTED: &str = "review/prompted";
}

/// Persisted interaction counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionCounterState {
    /// Counted interactions since the last trigger
    pub count: u32,
    /// When the last counted interaction happened
    pub last_counted_at: Option<PhysicalTime>,
}

/// Persisted launch gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaunchGateState {
    /// When a launch ad was last actually displayed
    pub last_shown_at: Option<PhysicalTime>,
}

/// Typed access to the policy's keys in the durable store.
#[derive(Clone)]
pub struct PolicyStore {
    storage: Arc<dyn StorageEffects>,
}

impl std::fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyStore").finish_non_exhaustive()
    }
}

impl PolicyStore {
    /// Store over any storage handler.
    pub fn new(storage: Arc<dyn StorageEffects>) -> Self {
        Self { storage }
    }

    /// Counter state; unreadable values read as zero.
    pub async fn load_counter(&self) -> InteractionCounterState {
        let count = self
            .read_u64(keys::INTERACTION_COUNT)
            .await
            .and_then(|c| u32::try_from(c).ok())
            .unwrap_or(0);
        let last_counted_at = self.read_timestamp(keys::LAST_INTERACTION_MS).await;
        InteractionCounterState {
            count,
            last_counted_at,
        }
    }

    /// Write count and last-counted time in one batch.
    pub async fn save_counter(&self, state: &InteractionCounterState) -> Result<(), StorageError> {
        let mut batch = HashMap::with_capacity(2);
        batch.insert(
            keys::INTERACTION_COUNT.to_string(),
            encode(u64::from(state.count)),
        );
        batch.insert(
            keys::LAST_INTERACTION_MS.to_string(),
            encode(state.last_counted_at.map_or(0, PhysicalTime::as_millis)),
        );
        self.storage.store_batch(batch).await
    }

    /// Launch gate state.
    pub async fn load_launch(&self) -> LaunchGateState {
        LaunchGateState {
            last_shown_at: self.read_timestamp(keys::LAUNCH_LAST_SHOWN_MS).await,
        }
    }

    /// Write the launch display time.
    pub async fn save_launch(&self, state: &LaunchGateState) -> Result<(), StorageError> {
        self.storage
            .store(
                keys::LAUNCH_LAST_SHOWN_MS,
                encode(state.last_shown_at.map_or(0, PhysicalTime::as_millis)),
            )
            .await
    }

    /// End of the persisted suppression window, `None` when inactive.
    pub async fn load_suppression(&self) -> Option<PhysicalTime> {
        self.read_timestamp(keys::SUPPRESSED_UNTIL_MS).await
    }

    /// Write the suppression deadline; `None` stores `0`.
    pub async fn save_suppression(&self, until: Option<PhysicalTime>) -> Result<(), StorageError> {
        self.storage
            .store(
                keys::SUPPRESSED_UNTIL_MS,
                encode(until.map_or(0, PhysicalTime::as_millis)),
            )
            .await
    }

    /// Boolean flag stored as `0`/`1`.
    pub async fn load_flag(&self, key: &str) -> bool {
        self.read_u64(key).await == Some(1)
    }

    /// Write a boolean flag.
    pub async fn save_flag(&self, key: &str, value: bool) -> Result<(), StorageError> {
        self.storage.store(key, encode(u64::from(value))).await
    }

    async fn read_timestamp(&self, key: &str) -> Option<PhysicalTime> {
        self.read_u64(key)
            .await
            .filter(|ms| *ms != 0)
            .map(PhysicalTime::from_millis)
    }

    async fn read_u64(&self, key: &str) -> Option<u64> {
        let raw = match self.storage.retrieve(key).await {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(key, %error, "state read failed; using zero value");
                return None;
            }
        };
        let parsed = std::str::from_utf8(&raw)
            .ok()
            .and_then(|text| text.trim().parse::<u64>().ok());
        if parsed.is_none() {
            tracing::warn!(key, len = raw.len(), "corrupt state value; using zero value");
        }
        parsed
    }
}

fn encode(value: u64) -> Vec<u8> {
    value.to_string().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_effects::MemoryStorageHandler;

    fn store() -> (MemoryStorageHandler, PolicyStore) {
        let memory = MemoryStorageHandler::new();
        let store = PolicyStore::new(Arc::new(memory.clone()));
        (memory, store)
    }

    #[tokio::test]
    async fn missing_keys_read_as_zero_values() {
        let (_, store) = store();
        assert_eq!(store.load_counter().await, InteractionCounterState::default());
        assert_eq!(store.load_launch().await, LaunchGateState::default());
        assert_eq!(store.load_suppression().await, None);
        assert!(!store.load_flag(keys::REVIEW_PROMPTED).await);
    }

    #[tokio::test]
    async fn counter_is_written_as_decimal_text() {
        let (memory, store) = store();
        let state = InteractionCounterState {
            count: 4,
            last_counted_at: Some(PhysicalTime::from_millis(1_700_000_000_000)),
        };
        store.save_counter(&state).await.unwrap();

        assert_eq!(
            memory.retrieve(keys::INTERACTION_COUNT).await.unwrap(),
            Some(b"4".to_vec())
        );
        assert_eq!(
            memory.retrieve(keys::LAST_INTERACTION_MS).await.unwrap(),
            Some(b"1700000000000".to_vec())
        );
        assert_eq!(store.load_counter().await, state);
    }

    #[tokio::test]
    async fn corrupt_values_read_as_zero() {
        let (memory, store) = store();
        memory
            .store(keys::INTERACTION_COUNT, b"seven".to_vec())
            .await
            .unwrap();
        memory
            .store(keys::SUPPRESSED_UNTIL_MS, vec![0xff, 0xfe])
            .await
            .unwrap();
        memory
            .store(keys::LAST_INTERACTION_MS, b"99999999999999999999999".to_vec())
            .await
            .unwrap();

        assert_eq!(store.load_counter().await, InteractionCounterState::default());
        assert_eq!(store.load_suppression().await, None);
    }

    #[tokio::test]
    async fn cleared_suppression_is_stored_as_zero() {
        let (memory, store) = store();
        store
            .save_suppression(Some(PhysicalTime::from_millis(42)))
            .await
            .unwrap();
        assert_eq!(
            store.load_suppression().await,
            Some(PhysicalTime::from_millis(42))
        );

        store.save_suppression(None).await.unwrap();
        assert_eq!(
            memory.retrieve(keys::SUPPRESSED_UNTIL_MS).await.unwrap(),
            Some(b"0".to_vec())
        );
        assert_eq!(store.load_suppression().await, None);
    }
}
