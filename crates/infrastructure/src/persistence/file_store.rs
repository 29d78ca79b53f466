//! Key-value store persisted as a single JSON document.
//!
//! The document lives at `<data dir>/workspace.json`. On Linux the default
//! data dir is `~/.config/courier`.
//!
//! Other processes may write the same file. Every read and write starts
//! from what is on disk, so their keys are never overwritten from a stale
//! copy, and keys they changed are announced to subscribers. [`JsonFileStore::watch`]
//! picks those changes up without waiting for the next read.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_application::ports::{
    KeyValueStore, StorageDelta, StorageError, delta_for_removal, delta_for_write,
};
use courier_domain::{StoreKey, StoredValues};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::fs;
use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, warn};

use super::memory_store::{CHANGE_BUFFER, announce, select};
use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File name of the persisted document.
pub const WORKSPACE_FILE: &str = "workspace.json";

/// How long file events are collected before the document is re-read.
pub const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Returns the platform's default data directory for Courier.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("courier"))
}

/// The file's contents, split into known keys and everything else.
#[derive(Debug, Default)]
struct Document {
    values: StoredValues,
    unknown: BTreeMap<String, serde_json::Value>,
}

/// A [`KeyValueStore`] backed by one JSON file.
///
/// Keeps the last document it saw, to tell which keys another writer
/// changed in the meantime.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    last_seen: Mutex<StoredValues>,
    changes: broadcast::Sender<StorageDelta>,
}

/// Keeps a [`JsonFileStore`] watching its file. Dropping it stops watching.
pub struct StoreWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl JsonFileStore {
    /// Opens the store in `dir`. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = dir.as_ref().join(WORKSPACE_FILE);
        let document = Self::read_document(&path).await?;
        for name in document.unknown.keys() {
            warn!(key = %name, "ignoring unknown key in workspace file");
        }
        debug!(path = %path.display(), keys = document.values.len(), "opened workspace file");
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Ok(Self {
            path,
            last_seen: Mutex::new(document.values),
            changes,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file and announces the keys another writer changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn refresh(&self) -> Result<(), StorageError> {
        let mut last_seen = self.last_seen.lock().await;
        self.catch_up(&mut last_seen).await.map(|_| ())
    }

    /// Watches the backing file and calls [`Self::refresh`] when it changes.
    ///
    /// Must be called from within a Tokio runtime. Creates the data dir if
    /// it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or watched.
    pub fn watch(store: &Arc<Self>) -> Result<StoreWatcher, StorageError> {
        let dir = store
            .path
            .parent()
            .ok_or_else(|| StorageError::Io(format!("{}: no parent directory", store.path.display())))?;
        std::fs::create_dir_all(dir).map_err(|e| StorageError::Io(format!("{}: {e}", dir.display())))?;

        let (touched, mut events) = mpsc::unbounded_channel();
        let file_name = store.path.file_name().map(ToOwned::to_owned);
        let mut debouncer = new_debouncer(WATCH_DEBOUNCE, move |result: DebounceEventResult| {
            match result {
                Ok(batch) => {
                    if batch.iter().any(|event| event.path.file_name() == file_name.as_deref()) {
                        let _ = touched.send(());
                    }
                }
                Err(err) => warn!(error = %err, "workspace file watch error"),
            }
        })
        .map_err(|e| StorageError::Io(e.to_string()))?;
        debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| StorageError::Io(format!("{}: {e}", dir.display())))?;

        let weak = Arc::downgrade(store);
        tokio::spawn(async move {
            while events.recv().await.is_some() {
                let Some(store) = weak.upgrade() else {
                    break;
                };
                if let Err(err) = store.refresh().await {
                    warn!(error = %err, "could not re-read workspace file");
                }
            }
        });
        debug!(path = %store.path.display(), "watching workspace file");

        Ok(StoreWatcher {
            _debouncer: debouncer,
        })
    }

    async fn read_document(path: &Path) -> Result<Document, StorageError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::default()),
            Err(e) => return Err(StorageError::Io(format!("{}: {e}", path.display()))),
        };
        let raw: BTreeMap<String, serde_json::Value> =
            from_json_bytes(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut document = Document::default();
        for (name, value) in raw {
            match StoreKey::from_name(&name) {
                Some(key) => {
                    document.values.insert(key, value);
                }
                None => {
                    document.unknown.insert(name, value);
                }
            }
        }
        Ok(document)
    }

    async fn write_document(&self, document: &Document) -> Result<(), StorageError> {
        let mut raw: BTreeMap<&str, &serde_json::Value> = document
            .unknown
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        raw.extend(document.values.iter().map(|(key, value)| (key.as_str(), value)));
        let bytes =
            to_json_stable_bytes(&raw).map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(format!("{}: {e}", parent.display())))?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, bytes)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", staging.display())))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", self.path.display())))
    }

    /// Reads the file, announces what changed since `last_seen` and makes
    /// the file's contents the new `last_seen`.
    async fn catch_up(&self, last_seen: &mut StoredValues) -> Result<Document, StorageError> {
        let document = Self::read_document(&self.path).await?;
        let delta = changed_between(last_seen, &document.values);
        if !delta.is_empty() {
            debug!(
                keys = ?delta.keys().map(|key| key.as_str()).collect::<Vec<_>>(),
                "workspace file changed on disk"
            );
        }
        last_seen.clone_from(&document.values);
        announce(&self.changes, delta);
        Ok(document)
    }
}

/// The delta that turns `before` into `after`.
fn changed_between(before: &StoredValues, after: &StoredValues) -> StorageDelta {
    let written: StoredValues = after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, value)| (*key, value.clone()))
        .collect();
    let mut delta = delta_for_write(&written);
    delta.extend(delta_for_removal(
        before.keys().filter(|key| !after.contains_key(*key)).copied(),
    ));
    delta
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[StoreKey]) -> Result<StoredValues, StorageError> {
        let mut last_seen = self.last_seen.lock().await;
        if let Err(err) = self.catch_up(&mut last_seen).await {
            warn!(error = %err, path = %self.path.display(), "workspace re-read failed, serving last known values");
        }
        Ok(select(&last_seen, keys))
    }

    async fn set(&self, values: StoredValues) -> Result<(), StorageError> {
        let mut last_seen = self.last_seen.lock().await;
        let mut document = self.catch_up(&mut last_seen).await?;
        document.values.extend(values.clone());
        if let Err(err) = self.write_document(&document).await {
            warn!(error = %err, path = %self.path.display(), "workspace write failed");
            return Err(err);
        }
        *last_seen = document.values;
        drop(last_seen);

        announce(&self.changes, delta_for_write(&values));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut last_seen = self.last_seen.lock().await;
        if let Err(err) = self.write_document(&Document::default()).await {
            warn!(error = %err, path = %self.path.display(), "workspace clear failed");
            return Err(err);
        }
        let removed = std::mem::take(&mut *last_seen);
        drop(last_seen);

        announce(&self.changes, delta_for_removal(removed.into_keys()));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageDelta> {
        self.changes.subscribe()
    }
}
