//! Key-value storage port
//!
//! The workspace persists into a flat store keyed by [`StoreKey`]. Writes
//! are shallow per-key overwrites; every write (from this process or any
//! other) is announced to subscribers as a [`StorageDelta`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use courier_domain::{StoreKey, StoredValues};
use tokio::sync::broadcast;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store has been shut down.
    #[error("storage is closed")]
    Closed,
}

/// The new value of one changed key. `None` means the key was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Value after the change.
    pub new_value: Option<serde_json::Value>,
}

/// One change notification: every key written together, with its new value.
pub type StorageDelta = BTreeMap<StoreKey, StorageChange>;

/// Builds the delta announcing that `values` were written.
#[must_use]
pub fn delta_for_write(values: &StoredValues) -> StorageDelta {
    values
        .iter()
        .map(|(key, value)| {
            (
                *key,
                StorageChange {
                    new_value: Some(value.clone()),
                },
            )
        })
        .collect()
}

/// Builds the delta announcing that the given keys were removed.
#[must_use]
pub fn delta_for_removal(keys: impl IntoIterator<Item = StoreKey>) -> StorageDelta {
    keys.into_iter()
        .map(|key| (key, StorageChange { new_value: None }))
        .collect()
}

/// Converts a delta into values, removed keys becoming JSON `null`.
#[must_use]
pub fn delta_values(delta: &StorageDelta) -> StoredValues {
    delta
        .iter()
        .map(|(key, change)| {
            (
                *key,
                change.new_value.clone().unwrap_or(serde_json::Value::Null),
            )
        })
        .collect()
}

/// Port for the persisted key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the given keys. Missing keys are absent from the result.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    async fn get(&self, keys: &[StoreKey]) -> Result<StoredValues, StorageError>;

    /// Overwrites each given key with its new value.
    ///
    /// # Errors
    /// Returns an error if the write does not reach the backing store.
    async fn set(&self, values: StoredValues) -> Result<(), StorageError>;

    /// Removes every key.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be cleared.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Subscribes to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StorageDelta>;
}
