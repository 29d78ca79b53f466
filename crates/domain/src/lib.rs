//! Courier Domain - Core business types
//!
//! This crate defines the workspace model for the Courier request
//! workbench: requests, responses, captured traffic, collections and
//! tabs, plus the pure state transitions over them.
//! All types here are pure Rust with no I/O dependencies.

pub mod collection;
pub mod error;
pub mod history;
pub mod id;
pub mod import;
pub mod request;
pub mod response;
pub mod state;
pub mod store;
pub mod tab;
pub mod tabs;
pub mod workspace;

pub use collection::{CollectionItem, DEFAULT_COLLECTION_NAME};
pub use error::{DomainError, DomainResult};
pub use history::{FormValue, LoggedBody, LoggedRequest};
pub use id::{WELCOME_TAB_ID, generate_id};
pub use import::{
    IMPORTED_REQUEST_NAME, ParsedBody, ParsedRequestFields, curl_fields_to_request, derive_name,
    log_to_request,
};
pub use request::{
    BodyType, FieldKind, FileAttachment, HeaderPair, HeaderPlan, HttpMethod, HttpRequest,
    KeyValue, RawBodyType, classify_headers,
};
pub use response::{HttpResponse, flatten_headers};
pub use state::{GENERIC_FAILURE_MESSAGE, RequestState};
pub use store::{StoreKey, StoredValues, Touched};
pub use tab::{TabItem, TabKind, TabStatus};
pub use tabs::{BulkClose, SendTicket, TabSet};
pub use workspace::{Applied, FoundRequest, RequestLocation, Workspace};
