//! The tab manager: open tabs, their order and the active tab.
//!
//! The tab list is never empty. Whenever an operation would leave it
//! empty, the welcome tab is put back before the operation returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::request::HttpRequest;
use crate::state::RequestState;
use crate::store::{StoreKey, StoredValues, Touched, decode, decode_list, encode};
use crate::tab::TabItem;

/// Closes several tabs relative to a pivot tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulkClose {
    /// Keep only the pivot.
    #[serde(rename = "close-others")]
    Others,
    /// Close everything right of the pivot.
    #[serde(rename = "close-right")]
    Right,
    /// Close everything left of the pivot.
    #[serde(rename = "close-left")]
    Left,
    /// Close every tab.
    #[serde(rename = "close-all")]
    All,
}

/// Identifies one send so its result can be matched to the tab it
/// started in.
///
/// A tab that is closed and opened again is a different tab; results of
/// sends started before the close are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    /// Tab the send belongs to.
    pub tab_id: String,
    generation: u64,
}

/// Ordered set of open tabs with exactly one active tab.
#[derive(Debug, Clone)]
pub struct TabSet {
    tabs: Vec<TabItem>,
    active_id: String,
    generations: BTreeMap<String, u64>,
    next_generation: u64,
}

fn tab_keys() -> Touched {
    Touched::of(&StoreKey::TABS)
}

impl TabSet {
    /// Creates a set holding only the welcome tab.
    #[must_use]
    pub fn new() -> Self {
        let mut set = Self {
            tabs: Vec::new(),
            active_id: String::new(),
            generations: BTreeMap::new(),
            next_generation: 0,
        };
        set.ensure_not_empty();
        set
    }

    /// Rebuilds a tab set from persisted tabs.
    ///
    /// Duplicate ids keep their first occurrence, the welcome tab is
    /// dropped when request tabs exist, in-flight sends come back idle,
    /// and an unknown active id falls back to the last tab.
    #[must_use]
    pub fn restore(tabs: Vec<TabItem>, active_id: Option<String>) -> Self {
        let mut set = Self::new();
        let has_requests = tabs.iter().any(|t| !t.is_welcome());
        let mut restored: Vec<TabItem> = Vec::with_capacity(tabs.len());
        for mut tab in tabs {
            if (has_requests && tab.is_welcome()) || restored.iter().any(|t| t.id == tab.id) {
                continue;
            }
            tab.state = tab.state.restored();
            restored.push(tab);
        }
        if restored.is_empty() {
            return set;
        }

        set.tabs.clear();
        set.generations.clear();
        for tab in restored {
            set.track(&tab.id);
            set.tabs.push(tab);
        }
        set.active_id = match active_id {
            Some(id) if set.get(&id).is_some() => id,
            _ => set.last_id(),
        };
        set
    }

    /// Restores from stored values. Unreadable tabs are skipped and
    /// reported; if none are left the welcome tab is shown.
    #[must_use]
    pub fn from_stored(values: &StoredValues) -> (Self, Vec<DomainError>) {
        let (tabs, mut rejected) = decode_list::<TabItem>(values, StoreKey::SavedTabs)
            .unwrap_or_else(|err| (Vec::new(), vec![err]));
        let active = decode::<String>(values, StoreKey::SavedActiveTabId)
            .unwrap_or_else(|err| {
                rejected.push(err);
                None
            });
        (Self::restore(tabs, active), rejected)
    }

    /// Encodes the tab list and active id for writing.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStoredValue`] if a tab cannot be
    /// encoded.
    pub fn stored_values(&self) -> Result<StoredValues, DomainError> {
        Ok(StoredValues::from([
            (StoreKey::SavedTabs, encode(StoreKey::SavedTabs, &self.tabs)?),
            (
                StoreKey::SavedActiveTabId,
                encode(StoreKey::SavedActiveTabId, &self.active_id)?,
            ),
        ]))
    }

    /// Returns the tabs in display order.
    #[must_use]
    pub fn tabs(&self) -> &[TabItem] {
        &self.tabs
    }

    /// Returns the id of the active tab.
    #[must_use]
    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// Returns the active tab.
    #[must_use]
    pub fn active(&self) -> Option<&TabItem> {
        self.get(&self.active_id)
    }

    /// Returns the tab with this id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TabItem> {
        self.tabs.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut TabItem> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    /// Number of open tabs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// Returns true if no tabs are open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    fn last_id(&self) -> String {
        self.tabs.last().map(|t| t.id.clone()).unwrap_or_default()
    }

    fn track(&mut self, id: &str) {
        self.next_generation += 1;
        self.generations.insert(id.to_string(), self.next_generation);
    }

    fn forget_closed(&mut self) {
        let open: Vec<&str> = self.tabs.iter().map(|t| t.id.as_str()).collect();
        self.generations.retain(|id, _| open.contains(&id.as_str()));
    }

    /// Puts the welcome tab back if the list is empty and repairs a
    /// dangling active id.
    fn ensure_not_empty(&mut self) {
        if self.tabs.is_empty() {
            let welcome = TabItem::welcome();
            self.track(&welcome.id);
            self.active_id.clone_from(&welcome.id);
            self.tabs.push(welcome);
        } else if self.get(&self.active_id).is_none() {
            self.active_id = self.last_id();
        }
        self.forget_closed();
    }

    /// Opens a request in a tab, or activates its existing tab.
    ///
    /// A lone welcome tab is replaced rather than kept beside the new tab.
    pub fn open_request(&mut self, request: HttpRequest) -> Touched {
        if self.get(&request.id).is_some() {
            return self.activate(&request.id);
        }
        let tab = TabItem::for_request(request);
        if self.tabs.first().is_some_and(TabItem::is_welcome) {
            self.tabs.retain(|t| !t.is_welcome());
        }
        self.track(&tab.id);
        self.active_id.clone_from(&tab.id);
        self.tabs.push(tab);
        self.forget_closed();
        tab_keys()
    }

    /// Makes the tab with this id active.
    pub fn activate(&mut self, id: &str) -> Touched {
        if self.get(id).is_none() || self.active_id == id {
            return Touched::none();
        }
        id.clone_into(&mut self.active_id);
        Touched::of(&[StoreKey::SavedActiveTabId])
    }

    /// Closes one tab. Closing the active tab activates the new last tab.
    pub fn close(&mut self, id: &str) -> Touched {
        let before = self.tabs.len();
        self.tabs.retain(|t| t.id != id);
        if self.tabs.len() == before {
            return Touched::none();
        }
        self.ensure_not_empty();
        tab_keys()
    }

    /// Closes every tab whose id is in `ids`.
    pub fn close_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> Touched {
        ids.into_iter()
            .fold(Touched::none(), |touched, id| touched.with(self.close(id)))
    }

    /// Moves the tab at `from` to index `to`. Out-of-range indices change
    /// nothing.
    pub fn reorder(&mut self, from: usize, to: usize) -> Touched {
        if from >= self.tabs.len() || to >= self.tabs.len() || from == to {
            return Touched::none();
        }
        let tab = self.tabs.remove(from);
        self.tabs.insert(to, tab);
        Touched::of(&[StoreKey::SavedTabs])
    }

    /// Closes tabs relative to the pivot's index in the current order.
    pub fn bulk_close(&mut self, action: BulkClose, pivot_id: &str) -> Touched {
        let Some(pivot) = self.tabs.iter().position(|t| t.id == pivot_id) else {
            return Touched::none();
        };
        let keep = |index: usize| match action {
            BulkClose::Others => index == pivot,
            BulkClose::Right => index <= pivot,
            BulkClose::Left => index >= pivot,
            BulkClose::All => false,
        };
        let before = self.tabs.len();
        self.tabs = std::mem::take(&mut self.tabs)
            .into_iter()
            .enumerate()
            .filter_map(|(index, tab)| keep(index).then_some(tab))
            .collect();
        if self.tabs.len() == before {
            return Touched::none();
        }
        self.ensure_not_empty();
        tab_keys()
    }

    /// Replaces the working copy of the request's tab, if open.
    pub fn update_request(&mut self, request: &HttpRequest) -> Touched {
        match self.get_mut(&request.id) {
            Some(tab) => {
                tab.set_data(request.clone());
                Touched::of(&[StoreKey::SavedTabs])
            }
            None => Touched::none(),
        }
    }

    /// Renames a tab and the request it holds.
    pub fn rename(&mut self, id: &str, name: &str) -> Touched {
        let Some(tab) = self.get_mut(id) else {
            return Touched::none();
        };
        name.clone_into(&mut tab.title);
        if let Some(data) = tab.data.as_mut() {
            name.clone_into(&mut data.name);
        }
        Touched::of(&[StoreKey::SavedTabs])
    }

    /// Puts a request tab into `Loading`, dropping any previous result.
    ///
    /// Returns the ticket for settling this send and the request to send,
    /// or `None` for the welcome tab or an unknown id.
    pub fn begin_send(&mut self, id: &str) -> Option<(SendTicket, HttpRequest)> {
        let generation = *self.generations.get(id)?;
        let tab = self.get_mut(id)?;
        let request = tab.data.clone()?;
        tab.state = RequestState::Loading;
        Some((
            SendTicket {
                tab_id: id.to_string(),
                generation,
            },
            request,
        ))
    }

    /// Records the outcome of a send.
    ///
    /// Returns false, changing nothing, if the tab was closed since the
    /// send began. Otherwise the latest settle wins.
    pub fn settle(&mut self, ticket: &SendTicket, outcome: RequestState) -> bool {
        if self.generations.get(&ticket.tab_id) != Some(&ticket.generation) {
            return false;
        }
        match self.get_mut(&ticket.tab_id) {
            Some(tab) => {
                tab.state = outcome;
                true
            }
            None => false,
        }
    }
}

impl Default for TabSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::id::WELCOME_TAB_ID;
    use crate::response::HttpResponse;
    use crate::tab::TabStatus;
    use pretty_assertions::assert_eq;

    fn named(name: &str) -> HttpRequest {
        HttpRequest {
            name: name.to_string(),
            ..HttpRequest::new()
        }
    }

    fn titles(set: &TabSet) -> Vec<String> {
        set.tabs().iter().map(|t| t.title.clone()).collect()
    }

    fn with_tabs(names: &[&str]) -> (TabSet, Vec<String>) {
        let mut set = TabSet::new();
        let mut ids = Vec::new();
        for name in names {
            let req = named(name);
            ids.push(req.id.clone());
            set.open_request(req);
        }
        (set, ids)
    }

    fn response() -> HttpResponse {
        HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: BTreeMap::new(),
            body: "ok".to_string(),
            time: 1,
            size: 2,
        }
    }

    #[test]
    fn test_new_set_is_welcome() {
        let set = TabSet::new();
        assert_eq!(set.len(), 1);
        assert_eq!(set.active_id(), WELCOME_TAB_ID);
        assert_eq!(set.active().unwrap().status(), TabStatus::Welcome);
    }

    #[test]
    fn test_open_replaces_welcome_and_is_idempotent() {
        let mut set = TabSet::new();
        let req = named("a");
        set.open_request(req.clone());
        set.open_request(req.clone());
        set.open_request(req.clone());

        assert_eq!(set.len(), 1);
        assert_eq!(set.active_id(), req.id);
        assert!(set.get(WELCOME_TAB_ID).is_none());
    }

    #[test]
    fn test_open_existing_only_activates() {
        let (mut set, ids) = with_tabs(&["a", "b"]);
        assert_eq!(set.active_id(), ids[1]);
        let mut again = named("ignored");
        again.id.clone_from(&ids[0]);
        let touched = set.open_request(again);
        assert_eq!(touched, Touched::of(&[StoreKey::SavedActiveTabId]));
        assert_eq!(set.active_id(), ids[0]);
        assert_eq!(titles(&set), vec!["a", "b"]);
    }

    #[test]
    fn test_close_last_tab_restores_welcome() {
        let (mut set, ids) = with_tabs(&["a"]);
        set.close(&ids[0]);
        assert_eq!(set.len(), 1);
        assert!(set.tabs()[0].is_welcome());
        assert_eq!(set.active_id(), WELCOME_TAB_ID);
    }

    #[test]
    fn test_close_welcome_tab_recreates_it() {
        let mut set = TabSet::new();
        assert!(!set.close(WELCOME_TAB_ID).is_empty());
        assert_eq!(set.len(), 1);
        assert!(set.tabs()[0].is_welcome());
    }

    #[test]
    fn test_close_active_activates_new_last() {
        let (mut set, ids) = with_tabs(&["a", "b", "c"]);
        set.activate(&ids[1]);
        set.close(&ids[1]);
        assert_eq!(set.active_id(), ids[2]);

        set.activate(&ids[0]);
        set.close(&ids[2]);
        assert_eq!(set.active_id(), ids[0]);
        assert!(set.close("unknown").is_empty());
    }

    #[test]
    fn test_reorder_keeps_active() {
        let (mut set, ids) = with_tabs(&["a", "b", "c"]);
        set.activate(&ids[1]);
        set.reorder(0, 2);
        assert_eq!(titles(&set), vec!["b", "c", "a"]);
        assert_eq!(set.active_id(), ids[1]);
        assert!(set.reorder(0, 9).is_empty());
    }

    #[test]
    fn test_bulk_close_relative_to_pivot() {
        let (mut set, ids) = with_tabs(&["a", "b", "c", "d"]);
        set.bulk_close(BulkClose::Right, &ids[1]);
        assert_eq!(titles(&set), vec!["a", "b"]);
        assert_eq!(set.active_id(), ids[1]);

        let (mut set, ids) = with_tabs(&["a", "b", "c", "d"]);
        set.bulk_close(BulkClose::Left, &ids[2]);
        assert_eq!(titles(&set), vec!["c", "d"]);

        let (mut set, ids) = with_tabs(&["a", "b", "c"]);
        set.activate(&ids[0]);
        set.bulk_close(BulkClose::Others, &ids[1]);
        assert_eq!(titles(&set), vec!["b"]);
        assert_eq!(set.active_id(), ids[1]);

        let (mut set, ids) = with_tabs(&["a", "b"]);
        set.bulk_close(BulkClose::All, &ids[0]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.active_id(), WELCOME_TAB_ID);
    }

    #[test]
    fn test_update_request_refreshes_title_and_method() {
        let (mut set, ids) = with_tabs(&["a"]);
        let mut edited = set.get(&ids[0]).unwrap().data.clone().unwrap();
        edited.name = "renamed".to_string();
        edited.method = crate::request::HttpMethod::Delete;
        set.update_request(&edited);

        let tab = set.get(&ids[0]).unwrap();
        assert_eq!(tab.title, "renamed");
        assert_eq!(tab.method, Some(crate::request::HttpMethod::Delete));
        assert!(set.update_request(&named("not open")).is_empty());
    }

    #[test]
    fn test_rename_updates_working_copy() {
        let (mut set, ids) = with_tabs(&["a"]);
        set.rename(&ids[0], "b");
        let tab = set.get(&ids[0]).unwrap();
        assert_eq!(tab.title, "b");
        assert_eq!(tab.data.as_ref().unwrap().name, "b");
    }

    #[test]
    fn test_send_lifecycle() {
        let (mut set, ids) = with_tabs(&["a"]);
        let (ticket, _) = set.begin_send(&ids[0]).unwrap();
        assert_eq!(set.get(&ids[0]).unwrap().status(), TabStatus::Loading);

        assert!(set.settle(&ticket, RequestState::success(response())));
        assert_eq!(set.get(&ids[0]).unwrap().status(), TabStatus::Success);

        let (ticket, _) = set.begin_send(&ids[0]).unwrap();
        let tab = set.get(&ids[0]).unwrap();
        assert!(tab.response().is_none());
        assert!(tab.error().is_none());

        assert!(set.settle(&ticket, RequestState::failed("refused")));
        assert_eq!(set.get(&ids[0]).unwrap().error(), Some("refused"));
    }

    #[test]
    fn test_last_settle_wins() {
        let (mut set, ids) = with_tabs(&["a"]);
        let (first, _) = set.begin_send(&ids[0]).unwrap();
        let (second, _) = set.begin_send(&ids[0]).unwrap();
        assert!(set.settle(&second, RequestState::failed("second")));
        assert!(set.settle(&first, RequestState::failed("first")));
        assert_eq!(set.get(&ids[0]).unwrap().error(), Some("first"));
    }

    #[test]
    fn test_settle_after_close_is_discarded() {
        let (mut set, ids) = with_tabs(&["a", "b"]);
        let (ticket, request) = set.begin_send(&ids[0]).unwrap();
        set.close(&ids[0]);
        assert!(!set.settle(&ticket, RequestState::success(response())));
        assert!(set.get(&ids[0]).is_none());

        set.open_request(request);
        assert!(!set.settle(&ticket, RequestState::success(response())));
        assert_eq!(set.get(&ids[0]).unwrap().status(), TabStatus::Idle);
    }

    #[test]
    fn test_welcome_tab_cannot_send() {
        let mut set = TabSet::new();
        assert!(set.begin_send(WELCOME_TAB_ID).is_none());
    }

    #[test]
    fn test_restore_sanitizes() {
        assert_eq!(TabSet::restore(Vec::new(), None).active_id(), WELCOME_TAB_ID);

        let mut loading = TabItem::for_request(named("a"));
        loading.state = RequestState::Loading;
        let other = TabItem::for_request(named("b"));
        let set = TabSet::restore(
            vec![TabItem::welcome(), loading.clone(), other.clone(), loading.clone()],
            Some("stale".to_string()),
        );

        assert_eq!(titles(&set), vec!["a", "b"]);
        assert_eq!(set.active_id(), other.id);
        assert_eq!(set.get(&loading.id).unwrap().status(), TabStatus::Idle);
    }

    #[test]
    fn test_stored_round_trip() {
        let (mut set, ids) = with_tabs(&["a", "b"]);
        set.activate(&ids[0]);
        let values = set.stored_values().unwrap();
        let (restored, rejected) = TabSet::from_stored(&values);
        assert!(rejected.is_empty());
        assert_eq!(titles(&restored), vec!["a", "b"]);
        assert_eq!(restored.active_id(), ids[0]);
    }

    #[test]
    fn test_unreadable_saved_tab_is_skipped() {
        let (set, _) = with_tabs(&["a", "b"]);
        let mut values = set.stored_values().unwrap();
        if let Some(serde_json::Value::Array(tabs)) = values.get_mut(&StoreKey::SavedTabs) {
            tabs.insert(1, serde_json::json!({"id": 5}));
        }

        let (restored, rejected) = TabSet::from_stored(&values);
        assert_eq!(rejected.len(), 1);
        assert_eq!(titles(&restored), vec!["a", "b"]);
    }
}
