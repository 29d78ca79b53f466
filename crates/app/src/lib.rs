//! Courier - wiring for the request workbench.
//!
//! [`start`] assembles the adapters into a [`WorkspaceSession`] and loads
//! the persisted workspace.

pub mod config;

use std::path::Path;
use std::sync::Arc;

use courier_application::ports::{StorageError, TransportError};
use courier_application::{KeyValueStore, PlatformServices, WorkspaceSession};
use courier_domain::TabStatus;
use courier_infrastructure::{
    CurlCommandCodec, HeaderRuleTable, JsonFileStore, ReqwestTransport, StoreWatcher,
    TransportConfig, rewrite_channel,
};
use serde::Serialize;
use tracing::{info, warn};

pub use config::{AppConfig, ConfigError};

/// Errors that stop start-up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The workspace file could not be opened.
    #[error("could not open workspace: {0}")]
    Storage(#[from] StorageError),

    /// The HTTP client could not be built.
    #[error("could not create HTTP client: {0}")]
    Transport(#[from] TransportError),
}

/// A running instance: the session plus the forced-header rules it drives.
pub struct Courier {
    /// The workspace session.
    pub session: WorkspaceSession,
    /// Rules currently installed by the rewrite service.
    pub rules: HeaderRuleTable,
    /// Watches the workspace file while held; `None` when the store is not
    /// a file or could not be watched.
    pub watcher: Option<StoreWatcher>,
}

/// Opens the workspace file in `config.data_dir`, watches it for writes
/// by other processes and starts a session on it.
///
/// # Errors
///
/// Returns an error if the workspace file is unreadable or the HTTP client
/// cannot be built.
pub async fn start(config: &AppConfig) -> Result<Courier, StartupError> {
    let store = Arc::new(JsonFileStore::open(&config.data_dir).await?);
    info!(path = %store.path().display(), "using workspace file");
    let watcher = JsonFileStore::watch(&store)
        .inspect_err(|err| warn!(error = %err, "not watching workspace file"))
        .ok();

    let mut courier = start_with_store(store, &config.transport).await?;
    courier.watcher = watcher;
    Ok(courier)
}

/// Starts a session on an already opened store.
///
/// Must be called from within a Tokio runtime; the rewrite worker is
/// spawned onto it.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub async fn start_with_store(
    storage: Arc<dyn KeyValueStore>,
    transport: &TransportConfig,
) -> Result<Courier, StartupError> {
    let rules = HeaderRuleTable::new();
    let (messaging, worker) = rewrite_channel(rules.clone());
    tokio::spawn(worker.run());

    let transport = ReqwestTransport::new(transport, rules.clone())?;
    let platform = PlatformServices::new(storage, Arc::new(messaging));
    let mut session =
        WorkspaceSession::new(platform, Arc::new(transport), Arc::new(CurlCommandCodec::new()));
    session.load_initial().await;

    Ok(Courier {
        session,
        rules,
        watcher: None,
    })
}

/// Whether `dir` already holds a workspace file.
#[must_use]
pub fn has_workspace(dir: &Path) -> bool {
    dir.join(courier_infrastructure::WORKSPACE_FILE).is_file()
}

/// One open tab, as printed by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabSummary {
    /// Tab id.
    pub id: String,
    /// Tab title.
    pub title: String,
    /// Request method, for request tabs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Current state.
    pub status: TabStatus,
    /// Response status code, once a response arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    /// Error text, if the last send failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An overview of the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummary {
    /// Number of collections.
    pub collections: usize,
    /// Number of saved requests, root and collections together.
    pub requests: usize,
    /// Number of captured logs.
    pub logs: usize,
    /// Whether capture is on.
    pub recording: bool,
    /// Id of the active tab.
    pub active_tab: String,
    /// Open tabs, in order.
    pub tabs: Vec<TabSummary>,
}

impl Courier {
    /// Summarizes the current workspace and tabs.
    #[must_use]
    pub fn summary(&self) -> WorkspaceSummary {
        let workspace = self.session.workspace();
        let tabs = self.session.tabs();
        WorkspaceSummary {
            collections: workspace.collections.len(),
            requests: workspace.request_count(),
            logs: workspace.logs.len(),
            recording: workspace.is_recording,
            active_tab: tabs.active_id().to_string(),
            tabs: tabs
                .tabs()
                .iter()
                .map(|tab| TabSummary {
                    id: tab.id.clone(),
                    title: tab.title.clone(),
                    method: tab.method.map(|m| m.to_string()),
                    status: tab.status(),
                    response_status: tab.response().map(|r| r.status),
                    error: tab.error().map(str::to_string),
                })
                .collect(),
        }
    }
}
