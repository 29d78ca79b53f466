//! In-memory key-value store.

use async_trait::async_trait;
use courier_application::ports::{
    KeyValueStore, StorageDelta, StorageError, delta_for_removal, delta_for_write,
};
use courier_domain::{StoreKey, StoredValues};
use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Buffered change notifications per subscriber before it lags.
pub const CHANGE_BUFFER: usize = 64;

/// Picks `keys` out of `values`, skipping absent ones.
pub(crate) fn select(values: &StoredValues, keys: &[StoreKey]) -> StoredValues {
    keys.iter()
        .filter_map(|key| values.get(key).map(|value| (*key, value.clone())))
        .collect()
}

/// Sends a delta to whoever is listening. No subscribers is not an error.
pub(crate) fn announce(changes: &broadcast::Sender<StorageDelta>, delta: StorageDelta) {
    if delta.is_empty() {
        return;
    }
    let _ = changes.send(delta);
}

/// A [`KeyValueStore`] that keeps everything in memory.
///
/// Share one instance (behind an `Arc`) between sessions to have them see
/// each other's writes.
#[derive(Debug)]
pub struct InMemoryStore {
    values: RwLock<StoredValues>,
    changes: broadcast::Sender<StorageDelta>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_values(StoredValues::new())
    }

    /// Creates a store holding `values`.
    #[must_use]
    pub fn with_values(values: StoredValues) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            values: RwLock::new(values),
            changes,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, keys: &[StoreKey]) -> Result<StoredValues, StorageError> {
        Ok(select(&self.values.read(), keys))
    }

    async fn set(&self, values: StoredValues) -> Result<(), StorageError> {
        let delta = delta_for_write(&values);
        self.values.write().extend(values);
        announce(&self.changes, delta);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let removed = std::mem::take(&mut *self.values.write());
        announce(&self.changes, delta_for_removal(removed.into_keys()));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageDelta> {
        self.changes.subscribe()
    }
}
