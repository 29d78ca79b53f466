//! Persisted key space and change tracking.
//!
//! The workspace persists into a flat key/value store. Reducers report
//! which keys they changed as a [`Touched`] set; the orchestration layer
//! writes exactly those keys back.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// One key of the persisted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreKey {
    /// Named collections and the requests they own.
    Collections,
    /// Requests not assigned to any collection.
    RootRequests,
    /// Captured traffic history.
    Logs,
    /// Open tabs, in order.
    SavedTabs,
    /// Id of the active tab.
    SavedActiveTabId,
    /// Whether traffic capture is on.
    IsRecording,
}

impl StoreKey {
    /// Every key, in load order.
    pub const ALL: [Self; 6] = [
        Self::Collections,
        Self::RootRequests,
        Self::Logs,
        Self::SavedTabs,
        Self::SavedActiveTabId,
        Self::IsRecording,
    ];

    /// Keys owned by the workspace store (as opposed to the tab manager).
    pub const WORKSPACE: [Self; 4] = [
        Self::Collections,
        Self::RootRequests,
        Self::Logs,
        Self::IsRecording,
    ];

    /// Keys owned by the tab manager.
    pub const TABS: [Self; 2] = [Self::SavedTabs, Self::SavedActiveTabId];

    /// Returns the key's name in the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collections => "collections",
            Self::RootRequests => "rootRequests",
            Self::Logs => "logs",
            Self::SavedTabs => "savedTabs",
            Self::SavedActiveTabId => "savedActiveTabId",
            Self::IsRecording => "isRecording",
        }
    }

    /// Looks a key up by its store name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial snapshot of the store: only the keys present were read or
/// are to be written.
pub type StoredValues = BTreeMap<StoreKey, serde_json::Value>;

/// Decodes the value stored under `key`.
///
/// An absent key or a JSON `null` yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`DomainError::InvalidStoredValue`] if the value has the wrong shape.
pub fn decode<T: DeserializeOwned>(values: &StoredValues, key: StoreKey) -> DomainResult<Option<T>> {
    match values.get(&key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|e| DomainError::InvalidStoredValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

/// Decodes the list stored under `key` one element at a time.
///
/// Elements that do not decode are left out and reported; the others are
/// kept in order. An absent key or a JSON `null` yields an empty list.
///
/// # Errors
///
/// Returns [`DomainError::InvalidStoredValue`] if the value is not a list.
pub fn decode_list<T: DeserializeOwned>(
    values: &StoredValues,
    key: StoreKey,
) -> DomainResult<(Vec<T>, Vec<DomainError>)> {
    match values.get(&key) {
        None | Some(serde_json::Value::Null) => Ok((Vec::new(), Vec::new())),
        Some(serde_json::Value::Array(items)) => Ok(decode_items(key, items)),
        Some(_) => Err(DomainError::InvalidStoredValue {
            key: key.to_string(),
            message: "expected a list".to_string(),
        }),
    }
}

/// Decodes each of `items`, keeping the ones that decode and reporting
/// the rest by position.
#[must_use]
pub fn decode_items<T: DeserializeOwned>(
    key: StoreKey,
    items: &[serde_json::Value],
) -> (Vec<T>, Vec<DomainError>) {
    let mut decoded = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(value) => decoded.push(value),
            Err(e) => rejected.push(DomainError::InvalidStoredValue {
                key: key.to_string(),
                message: format!("item {index}: {e}"),
            }),
        }
    }
    (decoded, rejected)
}

/// Encodes a value for storage under `key`.
///
/// # Errors
///
/// Returns [`DomainError::InvalidStoredValue`] if the value cannot be
/// represented as JSON.
pub fn encode<T: Serialize>(key: StoreKey, value: &T) -> DomainResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| DomainError::InvalidStoredValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// The set of store keys a state transition changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Touched(BTreeSet<StoreKey>);

impl Touched {
    /// Creates an empty set: nothing changed.
    #[must_use]
    pub const fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Creates a set holding the given keys.
    #[must_use]
    pub fn of(keys: &[StoreKey]) -> Self {
        Self(keys.iter().copied().collect())
    }

    /// Marks a key as changed.
    pub fn insert(&mut self, key: StoreKey) {
        self.0.insert(key);
    }

    /// Adds every key of `other`.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn with(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }

    /// Returns true if `key` changed.
    #[must_use]
    pub fn contains(&self, key: StoreKey) -> bool {
        self.0.contains(&key)
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the changed keys in key order.
    pub fn iter(&self) -> impl Iterator<Item = StoreKey> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StoreKey> for Touched {
    fn from_iter<T: IntoIterator<Item = StoreKey>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
