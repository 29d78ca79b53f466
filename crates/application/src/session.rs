//! Workspace session: the orchestration layer around the pure reducers.
//!
//! Every operation updates the in-memory workspace and tab set first,
//! then writes the changed keys through to storage before returning.
//! Sends are split into prepare / run / finish so that independent tabs
//! can have requests in flight at the same time while the session itself
//! stays single-owner.

use std::sync::Arc;

use courier_domain::{
    BulkClose, CollectionItem, HttpRequest, LoggedRequest, RequestState, SendTicket, StoreKey,
    StoredValues, TabItem, TabSet, Touched, Workspace, curl_fields_to_request, log_to_request,
};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::error::{ApplicationError, ApplicationResult};
use crate::execute_request::{ExecuteRequest, ExecuteResultExt};
use crate::platform::PlatformServices;
use crate::ports::{CurlCodec, HttpTransport, StorageDelta, delta_values};

/// Launch-context parameter naming a captured log to open on start.
pub const LOG_ID_PARAM: &str = "logId";

/// What a [`Subscription`] yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Keys were written, here or by another process.
    Changed(StorageDelta),
    /// Notifications were dropped; the workspace should be re-read.
    Lagged,
}

/// A handle on the storage change stream.
///
/// Dropping the handle, or calling [`stop`](Subscription::stop), releases
/// the stream.
#[derive(Debug)]
pub struct Subscription {
    receiver: Option<broadcast::Receiver<StorageDelta>>,
}

impl Subscription {
    /// Waits for the next change. Returns `None` once stopped or once the
    /// store has shut down.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        let receiver = self.receiver.as_mut()?;
        match receiver.recv().await {
            Ok(delta) => Some(SyncEvent::Changed(delta)),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "storage change stream lagged");
                Some(SyncEvent::Lagged)
            }
            Err(RecvError::Closed) => {
                self.receiver = None;
                None
            }
        }
    }

    /// Returns a change that is already waiting, without blocking.
    pub fn try_next_event(&mut self) -> Option<SyncEvent> {
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(delta) => Some(SyncEvent::Changed(delta)),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "storage change stream lagged");
                Some(SyncEvent::Lagged)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.receiver = None;
                None
            }
        }
    }

    /// Releases the stream. Later calls yield nothing.
    pub fn stop(&mut self) {
        if self.receiver.take().is_some() {
            debug!("storage subscription stopped");
        }
    }

    /// Returns true until the subscription is stopped or the store closes.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

/// A send that has been started on a tab and can run independently of
/// the session.
pub struct SendJob {
    ticket: SendTicket,
    request: HttpRequest,
    executor: ExecuteRequest,
}

impl SendJob {
    /// The tab this send belongs to.
    #[must_use]
    pub fn tab_id(&self) -> &str {
        &self.ticket.tab_id
    }

    /// Runs the execution pipeline.
    pub async fn run(self) -> SendOutcome {
        let state = self.executor.execute(&self.request).await.to_request_state();
        SendOutcome {
            ticket: self.ticket,
            state,
        }
    }
}

/// The settled result of a [`SendJob`].
#[derive(Debug)]
pub struct SendOutcome {
    ticket: SendTicket,
    /// State the tab settles into.
    pub state: RequestState,
}

/// Owns the workspace and tab state for one running instance.
pub struct WorkspaceSession {
    platform: PlatformServices,
    executor: ExecuteRequest,
    curl: Arc<dyn CurlCodec>,
    workspace: Workspace,
    tabs: TabSet,
    launch_handled: bool,
}

impl WorkspaceSession {
    /// Creates a session with an empty workspace and the welcome tab.
    ///
    /// Call [`load_initial`](Self::load_initial) to read persisted state.
    pub fn new(
        platform: PlatformServices,
        transport: Arc<dyn HttpTransport>,
        curl: Arc<dyn CurlCodec>,
    ) -> Self {
        let executor = ExecuteRequest::new(platform.messaging.clone(), transport);
        Self {
            platform,
            executor,
            curl,
            workspace: Workspace::default(),
            tabs: TabSet::new(),
            launch_handled: false,
        }
    }

    /// The current workspace.
    #[must_use]
    pub const fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// The open tabs.
    #[must_use]
    pub const fn tabs(&self) -> &TabSet {
        &self.tabs
    }

    /// The working copy held by the active tab, if it is a request tab.
    #[must_use]
    pub fn active_request(&self) -> Option<&HttpRequest> {
        self.tabs.active().and_then(|tab| tab.data.as_ref())
    }

    async fn persist(&self, touched: Touched) -> ApplicationResult<()> {
        if touched.is_empty() {
            return Ok(());
        }
        let mut values = self.workspace.stored_values(&touched)?;
        if StoreKey::TABS.iter().any(|key| touched.contains(*key)) {
            values.extend(
                self.tabs
                    .stored_values()?
                    .into_iter()
                    .filter(|(key, _)| touched.contains(*key)),
            );
        }
        debug!(keys = ?touched.iter().map(StoreKey::as_str).collect::<Vec<_>>(), "persisting");
        self.platform.storage.set(values).await?;
        Ok(())
    }

    /// Reads persisted state into the session.
    ///
    /// Never fails: unreadable storage or values fall back to an empty
    /// workspace and the welcome tab. Orphaned requests are reconciled and
    /// the repair is written back.
    pub async fn load_initial(&mut self) {
        let values = match self.platform.storage.get(&StoreKey::ALL).await {
            Ok(values) => values,
            Err(err) => {
                warn!(error = %err, "could not read workspace, starting empty");
                StoredValues::new()
            }
        };

        let (workspace, rejected) = Workspace::from_stored(&values);
        let (tabs, tab_rejected) = TabSet::from_stored(&values);
        for err in rejected.iter().chain(&tab_rejected) {
            warn!(error = %err, "ignoring unreadable stored value");
        }
        self.workspace = workspace;
        self.tabs = tabs;

        let repaired = self.workspace.reconcile_orphans();
        if let Err(err) = self.persist(repaired).await {
            warn!(error = %err, "could not write reconciled workspace");
        }

        info!(
            collections = self.workspace.collections.len(),
            root_requests = self.workspace.root_requests.len(),
            logs = self.workspace.logs.len(),
            recording = self.workspace.is_recording,
            tabs = self.tabs.len(),
            "workspace loaded"
        );
    }

    /// Subscribes to storage changes for the lifetime of the returned handle.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: Some(self.platform.storage.subscribe()),
        }
    }

    /// Applies one event from a [`Subscription`].
    ///
    /// # Errors
    /// Returns an error if a reconciliation write or a re-read fails.
    pub async fn handle_sync_event(&mut self, event: SyncEvent) -> ApplicationResult<Touched> {
        match event {
            SyncEvent::Changed(delta) => self.apply_external_change(&delta).await,
            SyncEvent::Lagged => self.resync().await,
        }
    }

    /// Merges a change notification, replacing each changed key whole.
    ///
    /// # Errors
    /// Returns an error if the reconciliation write fails.
    pub async fn apply_external_change(&mut self, delta: &StorageDelta) -> ApplicationResult<Touched> {
        let applied = self.workspace.apply_external_change(&delta_values(delta));
        for err in &applied.rejected {
            warn!(error = %err, "ignoring unreadable change");
        }
        if !applied.changed.is_empty() {
            debug!(
                keys = ?applied.changed.iter().map(StoreKey::as_str).collect::<Vec<_>>(),
                "applied external change"
            );
        }
        let repaired = self.workspace.reconcile_orphans();
        self.persist(repaired).await?;
        Ok(applied.changed)
    }

    async fn resync(&mut self) -> ApplicationResult<Touched> {
        let stored = self.platform.storage.get(&StoreKey::WORKSPACE).await?;
        let delta: StoredValues = StoreKey::WORKSPACE
            .into_iter()
            .map(|key| {
                let value = stored.get(&key).cloned().unwrap_or(serde_json::Value::Null);
                (key, value)
            })
            .collect();
        let applied = self.workspace.apply_external_change(&delta);
        let repaired = self.workspace.reconcile_orphans();
        self.persist(repaired).await?;
        Ok(applied.changed)
    }

    /// Opens the captured log named by the launch context's `logId`.
    ///
    /// Only the first call does anything. Returns true if a tab was opened.
    ///
    /// # Errors
    /// Returns an error if the tab change cannot be persisted.
    pub async fn handle_launch_context(&mut self, query: &str) -> ApplicationResult<bool> {
        if std::mem::replace(&mut self.launch_handled, true) {
            return Ok(false);
        }
        let query = query.strip_prefix('?').unwrap_or(query);
        let Some(log_id) = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == LOG_ID_PARAM)
            .map(|(_, value)| value.into_owned())
        else {
            return Ok(false);
        };
        let Some(log) = self.workspace.log(&log_id) else {
            info!(log_id = %log_id, "launch log not found");
            return Ok(false);
        };

        let request = log_to_request(log);
        info!(log_id = %log_id, "opening launch log");
        let touched = self.tabs.open_request(request);
        self.persist(touched).await?;
        Ok(true)
    }

    /// Creates a blank request at root and opens it.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn create_request(&mut self) -> ApplicationResult<String> {
        let request = HttpRequest::new();
        let id = request.id.clone();
        let touched = self
            .workspace
            .add_root_request(request.clone())
            .with(self.tabs.open_request(request));
        self.persist(touched).await?;
        Ok(id)
    }

    /// Opens a saved request or a captured log in a tab.
    ///
    /// Returns false if the id is unknown.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn open_request(&mut self, id: &str) -> ApplicationResult<bool> {
        let Some(found) = self.workspace.find_request_anywhere(id) else {
            return Ok(false);
        };
        let touched = self.tabs.open_request(found.request);
        self.persist(touched).await?;
        Ok(true)
    }

    /// Writes an edited request into its tab and wherever it is saved.
    ///
    /// If the parameter rows disagree with the URL's query string, the URL
    /// wins and the rows are re-derived from it.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn update_active_request(&mut self, mut request: HttpRequest) -> ApplicationResult<()> {
        if !request.params_in_sync() {
            let url = request.url.clone();
            request.set_url(url);
        }
        let touched = self
            .tabs
            .update_request(&request)
            .with(self.workspace.update_request(&request));
        self.persist(touched).await
    }

    /// Applies `edit` to the active tab's working copy and writes it back.
    ///
    /// Returns false if the active tab holds no request.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn edit_active(&mut self, edit: impl FnOnce(&mut HttpRequest)) -> ApplicationResult<bool> {
        let Some(mut request) = self.active_request().cloned() else {
            return Ok(false);
        };
        edit(&mut request);
        self.update_active_request(request).await?;
        Ok(true)
    }

    /// Pretty-prints the active request's raw body as JSON.
    ///
    /// # Errors
    /// Returns [`ApplicationError::Validation`] without changing anything
    /// if the body is not valid JSON.
    pub async fn format_active_json(&mut self) -> ApplicationResult<()> {
        let Some(mut request) = self.active_request().cloned() else {
            return Ok(());
        };
        request
            .format_json_body()
            .map_err(|e| ApplicationError::Validation(e.to_string()))?;
        self.update_active_request(request).await
    }

    /// Moves a request into a collection, or to root for `None`.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn move_request(&mut self, id: &str, target: Option<&str>) -> ApplicationResult<()> {
        let mut touched = self.workspace.move_request(id, target);
        if let Some(saved) = self.workspace.saved_request(id).cloned() {
            touched.extend(self.tabs.update_request(&saved));
        }
        self.persist(touched).await
    }

    /// Renames a request and its open tab.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn rename_request(&mut self, id: &str, name: &str) -> ApplicationResult<()> {
        let touched = self
            .workspace
            .rename_request(id, name)
            .with(self.tabs.rename(id, name));
        self.persist(touched).await
    }

    /// Renames a tab; the same as renaming its request.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn rename_tab(&mut self, id: &str, name: &str) -> ApplicationResult<()> {
        self.rename_request(id, name).await
    }

    /// Duplicates a saved request next to the original.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn duplicate_request(&mut self, id: &str) -> ApplicationResult<()> {
        let touched = self.workspace.duplicate_request(id);
        self.persist(touched).await
    }

    /// Deletes a saved request and closes its tab.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn delete_request(&mut self, id: &str) -> ApplicationResult<()> {
        let touched = self.workspace.delete_request(id).with(self.tabs.close(id));
        self.persist(touched).await
    }

    /// Creates an empty collection and returns its id.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn create_collection(&mut self) -> ApplicationResult<String> {
        let collection = CollectionItem::default();
        let id = collection.id.clone();
        let touched = self.workspace.add_collection(collection);
        self.persist(touched).await?;
        Ok(id)
    }

    /// Renames a collection.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn rename_collection(&mut self, id: &str, name: &str) -> ApplicationResult<()> {
        let touched = self.workspace.rename_collection(id, name);
        self.persist(touched).await
    }

    /// Deletes a collection and closes the tabs of the requests it held.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn delete_collection(&mut self, id: &str) -> ApplicationResult<()> {
        let owned: Vec<String> = self
            .workspace
            .collection(id)
            .map(|c| c.requests.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default();
        let touched = self
            .workspace
            .delete_collection(id)
            .with(self.tabs.close_many(owned.iter().map(String::as_str)));
        self.persist(touched).await
    }

    /// Collapses or expands a collection.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn toggle_collection(&mut self, id: &str) -> ApplicationResult<()> {
        let touched = self.workspace.toggle_collection(id);
        self.persist(touched).await
    }

    /// Deletes a captured log and closes the tab opened from it, unless
    /// that request has since been saved.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn delete_log(&mut self, id: &str) -> ApplicationResult<()> {
        let mut touched = self.workspace.delete_log(id);
        if self.workspace.saved_request(id).is_none() {
            touched.extend(self.tabs.close(id));
        }
        self.persist(touched).await
    }

    /// Removes every captured log.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn clear_history(&mut self) -> ApplicationResult<()> {
        let touched = self.workspace.clear_history();
        self.persist(touched).await
    }

    /// Turns traffic capture on or off.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn set_recording(&mut self, recording: bool) -> ApplicationResult<()> {
        let touched = self.workspace.set_recording(recording);
        self.persist(touched).await
    }

    /// Flips traffic capture and returns the new setting.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn toggle_recording(&mut self) -> ApplicationResult<bool> {
        let recording = !self.workspace.is_recording;
        self.set_recording(recording).await?;
        Ok(recording)
    }

    /// Captured logs matching `needle` in URL or method, any case.
    #[must_use]
    pub fn filter_history(&self, needle: &str) -> Vec<&LoggedRequest> {
        self.workspace.filter_history(needle)
    }

    /// Activates a tab.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn activate_tab(&mut self, id: &str) -> ApplicationResult<()> {
        let touched = self.tabs.activate(id);
        self.persist(touched).await
    }

    /// Closes a tab. An in-flight send on it is left running; its result
    /// is dropped.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn close_tab(&mut self, id: &str) -> ApplicationResult<()> {
        let touched = self.tabs.close(id);
        self.persist(touched).await
    }

    /// Moves a tab to another position.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn reorder_tabs(&mut self, from: usize, to: usize) -> ApplicationResult<()> {
        let touched = self.tabs.reorder(from, to);
        self.persist(touched).await
    }

    /// Closes tabs relative to a pivot tab.
    ///
    /// # Errors
    /// Returns an error if the change cannot be persisted.
    pub async fn bulk_close(&mut self, action: BulkClose, pivot_id: &str) -> ApplicationResult<()> {
        let touched = self.tabs.bulk_close(action, pivot_id);
        self.persist(touched).await
    }

    /// Imports a curl command as a new root request and opens it.
    ///
    /// # Errors
    /// Returns [`ApplicationError::Validation`] without changing anything
    /// if the text is not a curl command.
    pub async fn import_curl(&mut self, text: &str) -> ApplicationResult<String> {
        let fields = self
            .curl
            .parse(text)
            .ok_or_else(|| ApplicationError::Validation("Invalid curl command".to_string()))?;
        let request = curl_fields_to_request(fields);
        let id = request.id.clone();
        info!(request_id = %id, method = %request.method, "imported curl command");
        let touched = self
            .workspace
            .add_root_request(request.clone())
            .with(self.tabs.open_request(request));
        self.persist(touched).await?;
        Ok(id)
    }

    /// Renders a saved request, captured log or open tab as a curl command.
    #[must_use]
    pub fn export_curl(&self, id: &str) -> Option<String> {
        let request = self
            .workspace
            .find_request_anywhere(id)
            .map(|found| found.request)
            .or_else(|| self.tabs.get(id).and_then(|tab| tab.data.clone()))?;
        Some(self.curl.serialize(&request))
    }

    /// Clears storage and returns to an empty workspace with the welcome tab.
    ///
    /// # Errors
    /// Returns an error if storage cannot be cleared; local state is kept.
    pub async fn reset_all(&mut self) -> ApplicationResult<()> {
        self.platform.storage.clear().await?;
        self.workspace = Workspace::default();
        self.tabs = TabSet::new();
        info!("workspace reset");
        Ok(())
    }

    /// Puts a tab into `Loading` and returns the send to run.
    ///
    /// Returns `None` for the welcome tab or an unknown id.
    ///
    /// # Errors
    /// Returns an error if the tab change cannot be persisted.
    pub async fn prepare_send(&mut self, tab_id: &str) -> ApplicationResult<Option<SendJob>> {
        let Some((ticket, request)) = self.tabs.begin_send(tab_id) else {
            return Ok(None);
        };
        info!(tab = %tab_id, method = %request.method, url = %request.url, "sending request");
        self.persist(Touched::of(&[StoreKey::SavedTabs])).await?;
        Ok(Some(SendJob {
            ticket,
            request,
            executor: self.executor.clone(),
        }))
    }

    /// Settles a finished send onto its tab.
    ///
    /// Returns false if the tab was closed in the meantime; the result is
    /// dropped.
    ///
    /// # Errors
    /// Returns an error if the tab change cannot be persisted.
    pub async fn finish_send(&mut self, outcome: SendOutcome) -> ApplicationResult<bool> {
        let tab_id = outcome.ticket.tab_id.clone();
        match (outcome.state.response(), outcome.state.error()) {
            (Some(response), _) => info!(
                tab = %tab_id,
                status = response.status,
                elapsed_ms = response.time,
                size = response.size,
                "request settled"
            ),
            (None, Some(error)) => warn!(tab = %tab_id, error = %error, "request failed"),
            (None, None) => {}
        }
        if !self.tabs.settle(&outcome.ticket, outcome.state) {
            debug!(tab = %tab_id, "discarding result for closed tab");
            return Ok(false);
        }
        self.persist(Touched::of(&[StoreKey::SavedTabs])).await?;
        Ok(true)
    }

    /// Sends the request in a tab and waits for it to settle.
    ///
    /// # Errors
    /// Returns an error if a tab change cannot be persisted.
    pub async fn send(&mut self, tab_id: &str) -> ApplicationResult<Option<&TabItem>> {
        let Some(job) = self.prepare_send(tab_id).await? else {
            return Ok(None);
        };
        let outcome = job.run().await;
        self.finish_send(outcome).await?;
        Ok(self.tabs.get(tab_id))
    }

    /// Sends the active tab's request.
    ///
    /// # Errors
    /// Returns an error if a tab change cannot be persisted.
    pub async fn send_active(&mut self) -> ApplicationResult<Option<&TabItem>> {
        let active = self.tabs.active_id().to_string();
        self.send(&active).await
    }
}
