//! Named request collections

use serde::{Deserialize, Serialize};

use crate::id::generate_id;
use crate::request::HttpRequest;

/// Name given to newly created collections.
pub const DEFAULT_COLLECTION_NAME: &str = "New Collection";

/// A named, user-ordered group of requests.
///
/// The collection owns its `requests`; each of them carries this
/// collection's id in `collection_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionItem {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Requests in user order
    #[serde(default)]
    pub requests: Vec<HttpRequest>,
    /// Whether the collection is folded in the sidebar
    #[serde(default)]
    pub collapsed: bool,
}

impl CollectionItem {
    /// Creates an empty, expanded collection with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            requests: Vec::new(),
            collapsed: false,
        }
    }

    /// Returns the position of the request with this id.
    #[must_use]
    pub fn position(&self, request_id: &str) -> Option<usize> {
        self.requests.iter().position(|r| r.id == request_id)
    }

    /// Returns true if the collection holds the request with this id.
    #[must_use]
    pub fn contains(&self, request_id: &str) -> bool {
        self.position(request_id).is_some()
    }

    /// Appends a request, pointing its `collection_id` at this collection.
    pub fn push(&mut self, mut request: HttpRequest) {
        request.collection_id = Some(self.id.clone());
        self.requests.push(request);
    }
}

impl Default for CollectionItem {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION_NAME)
    }
}
