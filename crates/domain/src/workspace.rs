//! The workspace store: root requests, collections and captured history.
//!
//! Every mutation here is a pure state transition that reports the
//! persisted keys it changed. Unknown ids are not errors: the call may
//! arrive after another process deleted the target, so it simply changes
//! nothing.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::collection::CollectionItem;
use crate::error::DomainError;
use crate::history::LoggedRequest;
use crate::import::log_to_request;
use crate::request::HttpRequest;
use crate::store::{StoreKey, StoredValues, Touched, decode, decode_items, decode_list, encode};

/// Where a request was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestLocation {
    /// The workspace root list.
    Root,
    /// The collection with this id.
    Collection(String),
    /// The captured history; the request was converted from a log.
    History,
}

/// A request located by [`Workspace::find_request_anywhere`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundRequest {
    /// Where it lives.
    pub location: RequestLocation,
    /// A copy of the request (freshly converted for history hits).
    pub request: HttpRequest,
}

/// The outcome of merging an external change notification.
#[derive(Debug, Default)]
pub struct Applied {
    /// Keys that were replaced.
    pub changed: Touched,
    /// Values that could not be decoded and were skipped.
    pub rejected: Vec<DomainError>,
}

/// Authoritative in-memory state of saved requests and captured traffic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    /// Named collections, in user order.
    pub collections: Vec<CollectionItem>,
    /// Requests that belong to no collection.
    pub root_requests: Vec<HttpRequest>,
    /// Captured traffic, newest last.
    pub logs: Vec<LoggedRequest>,
    /// Whether traffic capture is on.
    pub is_recording: bool,
}

impl Workspace {
    /// Builds a workspace from stored values.
    ///
    /// Never fails: absent keys default to empty (or `false`), and values
    /// that do not decode are defaulted and reported alongside.
    #[must_use]
    pub fn from_stored(values: &StoredValues) -> (Self, Vec<DomainError>) {
        let mut workspace = Self::default();
        let mut rejected = Vec::new();
        for key in StoreKey::WORKSPACE {
            match workspace.replace_key(values, key) {
                Ok(skipped) => rejected.extend(skipped),
                Err(err) => rejected.push(err),
            }
        }
        (workspace, rejected)
    }

    /// Encodes the workspace-owned keys of `touched` for writing.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStoredValue`] if a value cannot be
    /// encoded.
    pub fn stored_values(&self, touched: &Touched) -> Result<StoredValues, DomainError> {
        let mut values = StoredValues::new();
        for key in touched.iter() {
            let value = match key {
                StoreKey::Collections => encode(key, &self.collections)?,
                StoreKey::RootRequests => encode(key, &self.root_requests)?,
                StoreKey::Logs => encode(key, &self.logs)?,
                StoreKey::IsRecording => encode(key, &self.is_recording)?,
                StoreKey::SavedTabs | StoreKey::SavedActiveTabId => continue,
            };
            values.insert(key, value);
        }
        Ok(values)
    }

    /// Merges a change notification by replacing each changed key whole.
    ///
    /// A key whose new value is absent (`null`) is reset to its default.
    /// Tab keys are ignored; the tab manager owns them.
    pub fn apply_external_change(&mut self, changes: &StoredValues) -> Applied {
        let mut applied = Applied::default();
        for key in StoreKey::WORKSPACE {
            if !changes.contains_key(&key) {
                continue;
            }
            match self.replace_key(changes, key) {
                Ok(skipped) => {
                    applied.changed.insert(key);
                    applied.rejected.extend(skipped);
                }
                Err(err) => applied.rejected.push(err),
            }
        }
        applied
    }

    /// Replaces one key from `values`, returning the rows that were skipped.
    ///
    /// A value of the wrong shape leaves the key untouched.
    fn replace_key(
        &mut self,
        values: &StoredValues,
        key: StoreKey,
    ) -> Result<Vec<DomainError>, DomainError> {
        let skipped = match key {
            StoreKey::Collections => {
                let (collections, skipped) = decode_collections(values)?;
                self.collections = collections;
                skipped
            }
            StoreKey::RootRequests => {
                let (requests, skipped) = decode_list(values, key)?;
                self.root_requests = requests;
                skipped
            }
            StoreKey::Logs => {
                let (logs, skipped) = decode_list(values, key)?;
                self.logs = logs;
                skipped
            }
            StoreKey::IsRecording => {
                self.is_recording = decode(values, key)?.unwrap_or_default();
                Vec::new()
            }
            StoreKey::SavedTabs | StoreKey::SavedActiveTabId => Vec::new(),
        };
        Ok(skipped)
    }

    /// Locates a request by id: root first, then each collection in order,
    /// then history (converting the log into a request).
    #[must_use]
    pub fn find_request_anywhere(&self, id: &str) -> Option<FoundRequest> {
        if let Some(request) = self.root_requests.iter().find(|r| r.id == id) {
            return Some(FoundRequest {
                location: RequestLocation::Root,
                request: request.clone(),
            });
        }
        for collection in &self.collections {
            if let Some(request) = collection.requests.iter().find(|r| r.id == id) {
                return Some(FoundRequest {
                    location: RequestLocation::Collection(collection.id.clone()),
                    request: request.clone(),
                });
            }
        }
        self.log(id).map(|log| FoundRequest {
            location: RequestLocation::History,
            request: log_to_request(log),
        })
    }

    /// Returns a saved request (root or collection), ignoring history.
    #[must_use]
    pub fn saved_request(&self, id: &str) -> Option<&HttpRequest> {
        self.root_requests
            .iter()
            .chain(self.collections.iter().flat_map(|c| c.requests.iter()))
            .find(|r| r.id == id)
    }

    /// Returns the collection with this id.
    #[must_use]
    pub fn collection(&self, id: &str) -> Option<&CollectionItem> {
        self.collections.iter().find(|c| c.id == id)
    }

    fn collection_mut(&mut self, id: &str) -> Option<&mut CollectionItem> {
        self.collections.iter_mut().find(|c| c.id == id)
    }

    /// Returns the captured log with this id.
    #[must_use]
    pub fn log(&self, id: &str) -> Option<&LoggedRequest> {
        self.logs.iter().find(|l| l.id == id)
    }

    /// Total number of saved requests across root and all collections.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.root_requests.len()
            + self
                .collections
                .iter()
                .map(|c| c.requests.len())
                .sum::<usize>()
    }

    /// Appends a request to the root list.
    pub fn add_root_request(&mut self, mut request: HttpRequest) -> Touched {
        request.collection_id = None;
        self.root_requests.push(request);
        Touched::of(&[StoreKey::RootRequests])
    }

    /// Writes an edited copy back over every saved request with its id.
    ///
    /// The copy keeps the owner of the slot it lands in, so a stale
    /// `collection_id` on a working copy never moves the request.
    pub fn update_request(&mut self, request: &HttpRequest) -> Touched {
        self.map_saved(&request.id, |slot, owner| {
            *slot = HttpRequest {
                collection_id: owner.map(str::to_string),
                ..request.clone()
            };
        })
    }

    /// Renames every saved request with this id.
    pub fn rename_request(&mut self, id: &str, name: &str) -> Touched {
        self.map_saved(id, |slot, _| name.clone_into(&mut slot.name))
    }

    fn map_saved(
        &mut self,
        id: &str,
        mut apply: impl FnMut(&mut HttpRequest, Option<&str>),
    ) -> Touched {
        let mut touched = Touched::none();
        for slot in self.root_requests.iter_mut().filter(|r| r.id == id) {
            apply(slot, None);
            touched.insert(StoreKey::RootRequests);
        }
        for collection in &mut self.collections {
            let owner = collection.id.clone();
            for slot in collection.requests.iter_mut().filter(|r| r.id == id) {
                apply(slot, Some(owner.as_str()));
                touched.insert(StoreKey::Collections);
            }
        }
        touched
    }

    /// Moves a request into a collection, or to root when `target` is `None`.
    ///
    /// The request is looked up with [`find_request_anywhere`], so a
    /// history entry is converted and saved. Moving into a collapsed
    /// collection expands it. An unknown request or target collection
    /// changes nothing.
    ///
    /// [`find_request_anywhere`]: Workspace::find_request_anywhere
    pub fn move_request(&mut self, id: &str, target: Option<&str>) -> Touched {
        if target.is_some_and(|t| self.collection(t).is_none()) {
            return Touched::none();
        }
        let Some(found) = self.find_request_anywhere(id) else {
            return Touched::none();
        };

        self.remove_saved(id);
        match target {
            Some(collection_id) => {
                if let Some(collection) = self.collection_mut(collection_id) {
                    collection.push(found.request);
                    collection.collapsed = false;
                }
            }
            None => {
                let mut request = found.request;
                request.collection_id = None;
                self.root_requests.push(request);
            }
        }
        Touched::of(&[StoreKey::RootRequests, StoreKey::Collections])
    }

    /// Appends a copy of a saved request next to the original's list.
    pub fn duplicate_request(&mut self, id: &str) -> Touched {
        let Some(original) = self.saved_request(id) else {
            return Touched::none();
        };
        let copy = original.duplicate();
        let owner = copy
            .collection_id
            .clone()
            .filter(|c| self.collection(c).is_some());

        match owner {
            Some(collection_id) => {
                if let Some(collection) = self.collection_mut(&collection_id) {
                    collection.push(copy);
                }
                Touched::of(&[StoreKey::Collections])
            }
            None => self.add_root_request(copy),
        }
    }

    /// Deletes a saved request from root and every collection.
    pub fn delete_request(&mut self, id: &str) -> Touched {
        self.remove_saved(id)
    }

    fn remove_saved(&mut self, id: &str) -> Touched {
        let mut touched = Touched::none();
        let before = self.root_requests.len();
        self.root_requests.retain(|r| r.id != id);
        if self.root_requests.len() != before {
            touched.insert(StoreKey::RootRequests);
        }
        for collection in &mut self.collections {
            let before = collection.requests.len();
            collection.requests.retain(|r| r.id != id);
            if collection.requests.len() != before {
                touched.insert(StoreKey::Collections);
            }
        }
        touched
    }

    /// Appends a collection.
    pub fn add_collection(&mut self, collection: CollectionItem) -> Touched {
        self.collections.push(collection);
        Touched::of(&[StoreKey::Collections])
    }

    /// Renames a collection.
    pub fn rename_collection(&mut self, id: &str, name: &str) -> Touched {
        match self.collection_mut(id) {
            Some(collection) => {
                name.clone_into(&mut collection.name);
                Touched::of(&[StoreKey::Collections])
            }
            None => Touched::none(),
        }
    }

    /// Deletes a collection together with the requests it owns.
    pub fn delete_collection(&mut self, id: &str) -> Touched {
        let before = self.collections.len();
        self.collections.retain(|c| c.id != id);
        if self.collections.len() == before {
            Touched::none()
        } else {
            Touched::of(&[StoreKey::Collections])
        }
    }

    /// Flips a collection between collapsed and expanded.
    pub fn toggle_collection(&mut self, id: &str) -> Touched {
        match self.collection_mut(id) {
            Some(collection) => {
                collection.collapsed = !collection.collapsed;
                Touched::of(&[StoreKey::Collections])
            }
            None => Touched::none(),
        }
    }

    /// Deletes one captured log.
    pub fn delete_log(&mut self, id: &str) -> Touched {
        let before = self.logs.len();
        self.logs.retain(|l| l.id != id);
        if self.logs.len() == before {
            Touched::none()
        } else {
            Touched::of(&[StoreKey::Logs])
        }
    }

    /// Removes every captured log.
    pub fn clear_history(&mut self) -> Touched {
        self.logs.clear();
        Touched::of(&[StoreKey::Logs])
    }

    /// Turns traffic capture on or off.
    pub fn set_recording(&mut self, recording: bool) -> Touched {
        self.is_recording = recording;
        Touched::of(&[StoreKey::IsRecording])
    }

    /// Returns the logs whose URL or method contains `needle` (any case).
    #[must_use]
    pub fn filter_history(&self, needle: &str) -> Vec<&LoggedRequest> {
        self.logs.iter().filter(|l| l.matches_filter(needle)).collect()
    }

    /// Restores the ownership invariants after a load or external change.
    ///
    /// The list that holds a request decides where it lives: root requests
    /// lose any `collection_id`, collection requests point at their holder.
    /// If several lists hold the same id, the first in lookup order (root,
    /// then collections in order) keeps it.
    pub fn reconcile_orphans(&mut self) -> Touched {
        let mut touched = Touched::none();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        let before = self.root_requests.len();
        self.root_requests.retain(|r| seen.insert(r.id.clone()));
        if self.root_requests.len() != before {
            touched.insert(StoreKey::RootRequests);
        }
        for request in &mut self.root_requests {
            if request.collection_id.take().is_some() {
                touched.insert(StoreKey::RootRequests);
            }
        }

        for collection in &mut self.collections {
            let before = collection.requests.len();
            collection.requests.retain(|r| seen.insert(r.id.clone()));
            if collection.requests.len() != before {
                touched.insert(StoreKey::Collections);
            }
            for request in &mut collection.requests {
                if request.collection_id.as_deref() != Some(collection.id.as_str()) {
                    request.collection_id = Some(collection.id.clone());
                    touched.insert(StoreKey::Collections);
                }
            }
        }
        touched
    }
}

/// Decodes the collections list, skipping unreadable collections and,
/// inside readable ones, unreadable requests.
fn decode_collections(
    values: &StoredValues,
) -> Result<(Vec<CollectionItem>, Vec<DomainError>), DomainError> {
    let key = StoreKey::Collections;
    let (objects, mut skipped) =
        decode_list::<serde_json::Map<String, serde_json::Value>>(values, key)?;

    let mut collections = Vec::with_capacity(objects.len());
    for mut object in objects {
        let requests = match object.remove("requests") {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        };
        match CollectionItem::deserialize(serde_json::Value::Object(object)) {
            Ok(mut collection) => {
                let (requests, bad) = decode_items(key, &requests);
                collection.requests = requests;
                skipped.extend(bad);
                collections.push(collection);
            }
            Err(e) => skipped.push(DomainError::InvalidStoredValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
    Ok((collections, skipped))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request(name: &str) -> HttpRequest {
        HttpRequest {
            name: name.to_string(),
            ..HttpRequest::with_url(HttpMethod::Get, format!("https://x.com/{name}"))
        }
    }

    fn sample() -> (Workspace, String, String) {
        let mut ws = Workspace::default();
        let mut users = CollectionItem::new("Users");
        let in_collection = request("list");
        let in_collection_id = in_collection.id.clone();
        users.push(in_collection);
        let collection_id = users.id.clone();
        ws.add_collection(users);
        ws.add_root_request(request("root"));
        (ws, collection_id, in_collection_id)
    }

    #[test]
    fn test_from_stored_fails_soft() {
        let values = StoredValues::from([
            (StoreKey::RootRequests, json!([{"id": "r1", "name": "Ping"}])),
            (StoreKey::Logs, json!({"not": "a list"})),
        ]);
        let (ws, rejected) = Workspace::from_stored(&values);

        assert_eq!(ws.root_requests.len(), 1);
        assert_eq!(ws.root_requests[0].method, HttpMethod::Get);
        assert!(ws.logs.is_empty());
        assert!(ws.collections.is_empty());
        assert!(!ws.is_recording);
        assert_eq!(rejected.len(), 1);
    }

    #[test]
    fn test_unreadable_rows_do_not_drop_their_neighbours() {
        let values = StoredValues::from([
            (
                StoreKey::RootRequests,
                json!([
                    {"id": "a", "name": "A"},
                    {"id": "b", "name": "B", "method": "TRACE"},
                    {"id": "c", "name": "C", "method": "BREW"}
                ]),
            ),
            (
                StoreKey::Collections,
                json!([
                    {"id": "col", "name": "Users", "requests": [
                        {"id": "u1", "name": "List", "collectionId": "col"},
                        {"id": "u2", "name": 7}
                    ]},
                    {"name": "no id"}
                ]),
            ),
        ]);
        let (ws, rejected) = Workspace::from_stored(&values);

        assert_eq!(
            ws.root_requests.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(ws.collections.len(), 1);
        assert_eq!(ws.collections[0].requests.len(), 1);
        assert_eq!(ws.collections[0].requests[0].id, "u1");
        assert_eq!(rejected.len(), 3);
    }

    #[test]
    fn test_external_change_of_wrong_shape_keeps_current_value() {
        let (mut ws, _, _) = sample();
        let before = ws.root_requests.clone();

        let applied = ws.apply_external_change(&StoredValues::from([(
            StoreKey::RootRequests,
            json!("garbage"),
        )]));

        assert!(applied.changed.is_empty());
        assert_eq!(applied.rejected.len(), 1);
        assert_eq!(ws.root_requests, before);
    }

    #[test]
    fn test_find_prefers_root_then_collections_then_history() {
        let (mut ws, collection_id, in_collection_id) = sample();
        let root_id = ws.root_requests[0].id.clone();
        ws.logs.push(LoggedRequest::new("log-1", "GET", "https://x.com/"));

        let found = ws.find_request_anywhere(&root_id).unwrap();
        assert_eq!(found.location, RequestLocation::Root);

        let found = ws.find_request_anywhere(&in_collection_id).unwrap();
        assert_eq!(found.location, RequestLocation::Collection(collection_id));

        let found = ws.find_request_anywhere("log-1").unwrap();
        assert_eq!(found.location, RequestLocation::History);
        assert_eq!(found.request.name, "https://x.com");

        assert!(ws.find_request_anywhere("missing").is_none());
    }

    #[test]
    fn test_update_request_writes_back_in_place() {
        let (mut ws, collection_id, in_collection_id) = sample();
        let mut edited = ws.saved_request(&in_collection_id).unwrap().clone();
        edited.url = "https://x.com/edited".to_string();
        edited.collection_id = None;

        let touched = ws.update_request(&edited);
        assert_eq!(touched, Touched::of(&[StoreKey::Collections]));
        let stored = ws.saved_request(&in_collection_id).unwrap();
        assert_eq!(stored.url, "https://x.com/edited");
        assert_eq!(stored.collection_id.as_deref(), Some(collection_id.as_str()));
        assert_eq!(ws.request_count(), 2);
    }

    #[test]
    fn test_update_unsaved_request_touches_nothing() {
        let (mut ws, _, _) = sample();
        assert!(ws.update_request(&request("scratch")).is_empty());
    }

    #[test]
    fn test_move_between_root_and_collection_preserves_count() {
        let (mut ws, collection_id, in_collection_id) = sample();
        let root_id = ws.root_requests[0].id.clone();
        ws.collections[0].collapsed = true;

        ws.move_request(&root_id, Some(collection_id.as_str()));
        assert_eq!(ws.request_count(), 2);
        assert!(ws.root_requests.is_empty());
        assert!(!ws.collections[0].collapsed);
        let moved = ws.collections[0].requests.last().unwrap();
        assert_eq!(moved.id, root_id);
        assert_eq!(moved.collection_id.as_deref(), Some(collection_id.as_str()));

        ws.move_request(&in_collection_id, None);
        assert_eq!(ws.request_count(), 2);
        assert_eq!(ws.root_requests.len(), 1);
        assert!(ws.root_requests[0].collection_id.is_none());
        assert!(!ws.collections[0].contains(&in_collection_id));
    }

    #[test]
    fn test_move_from_history_saves_converted_log() {
        let (mut ws, collection_id, _) = sample();
        ws.logs.push(LoggedRequest::new("log-9", "POST", "https://x.com/submit"));

        let touched = ws.move_request("log-9", Some(collection_id.as_str()));
        assert!(touched.contains(StoreKey::Collections));
        assert_eq!(ws.request_count(), 3);
        assert_eq!(ws.logs.len(), 1);
        let saved = ws.saved_request("log-9").unwrap();
        assert_eq!(saved.method, HttpMethod::Post);
        assert_eq!(saved.name, "/submit");
    }

    #[test]
    fn test_move_unknown_is_noop() {
        let (mut ws, collection_id, in_collection_id) = sample();
        let before = ws.clone();
        assert!(ws.move_request("missing", Some(collection_id.as_str())).is_empty());
        assert!(ws.move_request(&in_collection_id, Some("gone")).is_empty());
        assert_eq!(ws, before);
    }

    #[test]
    fn test_rename_and_duplicate() {
        let (mut ws, collection_id, in_collection_id) = sample();
        ws.rename_request(&in_collection_id, "All users");
        ws.duplicate_request(&in_collection_id);

        let names: Vec<_> = ws.collections[0].requests.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["All users", "All users Copy"]);
        let copy = &ws.collections[0].requests[1];
        assert_ne!(copy.id, in_collection_id);
        assert_eq!(copy.collection_id.as_deref(), Some(collection_id.as_str()));

        let root_id = ws.root_requests[0].id.clone();
        assert_eq!(ws.duplicate_request(&root_id), Touched::of(&[StoreKey::RootRequests]));
        assert_eq!(ws.root_requests[1].name, "root Copy");
        assert!(ws.duplicate_request("missing").is_empty());
    }

    #[test]
    fn test_delete_request_and_collection() {
        let (mut ws, collection_id, in_collection_id) = sample();
        assert_eq!(
            ws.delete_request(&in_collection_id),
            Touched::of(&[StoreKey::Collections])
        );
        assert!(ws.delete_request(&in_collection_id).is_empty());

        assert!(!ws.delete_collection(&collection_id).is_empty());
        assert!(ws.collections.is_empty());
        assert!(ws.delete_collection(&collection_id).is_empty());
    }

    #[test]
    fn test_collection_rename_and_toggle() {
        let (mut ws, collection_id, _) = sample();
        ws.rename_collection(&collection_id, "Accounts");
        ws.toggle_collection(&collection_id);
        assert_eq!(ws.collections[0].name, "Accounts");
        assert!(ws.collections[0].collapsed);
        assert!(ws.toggle_collection("nope").is_empty());
    }

    #[test]
    fn test_history_operations() {
        let mut ws = Workspace::default();
        ws.logs.push(LoggedRequest::new("a", "GET", "https://api.x.com/users"));
        ws.logs.push(LoggedRequest::new("b", "POST", "https://cdn.x.com/img"));

        assert_eq!(ws.filter_history("API").len(), 1);
        assert_eq!(ws.filter_history("post")[0].id, "b");
        assert_eq!(ws.delete_log("a"), Touched::of(&[StoreKey::Logs]));
        assert!(ws.delete_log("a").is_empty());
        ws.clear_history();
        assert!(ws.logs.is_empty());
        assert_eq!(ws.set_recording(true), Touched::of(&[StoreKey::IsRecording]));
        assert!(ws.is_recording);
    }

    #[test]
    fn test_external_change_replaces_whole_keys() {
        let (mut ws, _, _) = sample();
        let changes = StoredValues::from([
            (StoreKey::RootRequests, json!([])),
            (StoreKey::IsRecording, json!(true)),
            (StoreKey::Collections, serde_json::Value::Null),
            (StoreKey::SavedTabs, json!([])),
        ]);
        let applied = ws.apply_external_change(&changes);

        assert_eq!(
            applied.changed,
            Touched::of(&[StoreKey::RootRequests, StoreKey::IsRecording, StoreKey::Collections])
        );
        assert!(applied.rejected.is_empty());
        assert!(ws.root_requests.is_empty());
        assert!(ws.collections.is_empty());
        assert!(ws.is_recording);
    }

    #[test]
    fn test_external_change_with_bad_value_keeps_state() {
        let (mut ws, _, _) = sample();
        let applied = ws.apply_external_change(&StoredValues::from([(
            StoreKey::Collections,
            json!(42),
        )]));
        assert!(applied.changed.is_empty());
        assert_eq!(applied.rejected.len(), 1);
        assert_eq!(ws.collections.len(), 1);
    }

    #[test]
    fn test_reconcile_orphans() {
        let (mut ws, collection_id, _) = sample();
        ws.root_requests[0].collection_id = Some("deleted-collection".to_string());
        ws.collections[0].requests[0].collection_id = None;
        let dup = ws.root_requests[0].clone();
        ws.collections[0].requests.push(dup);

        let touched = ws.reconcile_orphans();
        assert_eq!(
            touched,
            Touched::of(&[StoreKey::RootRequests, StoreKey::Collections])
        );
        assert!(ws.root_requests[0].collection_id.is_none());
        assert_eq!(ws.collections[0].requests.len(), 1);
        assert_eq!(
            ws.collections[0].requests[0].collection_id.as_deref(),
            Some(collection_id.as_str())
        );
        assert!(ws.reconcile_orphans().is_empty());
    }

    #[test]
    fn test_stored_values_skip_tab_keys() {
        let (ws, _, _) = sample();
        let values = ws
            .stored_values(&Touched::of(&[StoreKey::RootRequests, StoreKey::SavedTabs]))
            .unwrap();
        assert_eq!(values.keys().copied().collect::<Vec<_>>(), vec![StoreKey::RootRequests]);
    }
}
