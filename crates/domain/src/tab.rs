//! Editor tabs

use serde::{Deserialize, Serialize};

use crate::id::WELCOME_TAB_ID;
use crate::request::{HttpMethod, HttpRequest};
use crate::response::HttpResponse;
use crate::state::RequestState;

/// Title of the welcome tab.
pub const WELCOME_TAB_TITLE: &str = "Welcome";

/// What a tab shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
    /// The placeholder shown when nothing else is open.
    Welcome,
    /// A request editor.
    Request,
}

/// The single state a tab is in, welcome tabs included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    /// The welcome placeholder.
    Welcome,
    /// A request tab with nothing sent.
    Idle,
    /// A request tab with a send in flight.
    Loading,
    /// A request tab showing a response.
    Success,
    /// A request tab showing an error.
    Failed,
}

/// One open tab.
///
/// A request tab's id is the id of the request it holds, so a request
/// can never be open in two tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabItem {
    /// Tab id (`"welcome"`, or the request id)
    pub id: String,
    /// What the tab shows
    #[serde(rename = "type")]
    pub kind: TabKind,
    /// Title shown on the tab
    pub title: String,
    /// Method badge for request tabs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    /// Working copy of the request, including unsaved edits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HttpRequest>,
    /// Execution state of the last send
    #[serde(default, rename = "execution")]
    pub state: RequestState,
}

impl TabItem {
    /// Creates the welcome tab.
    #[must_use]
    pub fn welcome() -> Self {
        Self {
            id: WELCOME_TAB_ID.to_string(),
            kind: TabKind::Welcome,
            title: WELCOME_TAB_TITLE.to_string(),
            method: None,
            data: None,
            state: RequestState::Idle,
        }
    }

    /// Creates an idle tab holding a working copy of `request`.
    #[must_use]
    pub fn for_request(request: HttpRequest) -> Self {
        Self {
            id: request.id.clone(),
            kind: TabKind::Request,
            title: request.name.clone(),
            method: Some(request.method),
            data: Some(request),
            state: RequestState::Idle,
        }
    }

    /// Returns true if this is the welcome tab.
    #[must_use]
    pub fn is_welcome(&self) -> bool {
        self.kind == TabKind::Welcome
    }

    /// Returns the tab's current status.
    #[must_use]
    pub const fn status(&self) -> TabStatus {
        match (self.kind, &self.state) {
            (TabKind::Welcome, _) => TabStatus::Welcome,
            (TabKind::Request, RequestState::Idle) => TabStatus::Idle,
            (TabKind::Request, RequestState::Loading) => TabStatus::Loading,
            (TabKind::Request, RequestState::Success { .. }) => TabStatus::Success,
            (TabKind::Request, RequestState::Failed { .. }) => TabStatus::Failed,
        }
    }

    /// Returns true while a send is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Returns the last response, if any.
    #[must_use]
    pub fn response(&self) -> Option<&HttpResponse> {
        self.state.response()
    }

    /// Returns the last error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    /// Replaces the working copy, keeping title and method badge in step.
    pub fn set_data(&mut self, request: HttpRequest) {
        self.title.clone_from(&request.name);
        self.method = Some(request.method);
        self.data = Some(request);
    }
}
