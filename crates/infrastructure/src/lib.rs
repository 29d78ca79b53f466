//! Courier Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod curl;
pub mod http;
pub mod persistence;
pub mod rewrite;
pub mod serialization;

pub use adapters::{DEFAULT_MAX_REDIRECTS, ReqwestTransport, TransportConfig};
pub use curl::{CurlCommandCodec, parse_curl, render_curl};
pub use http::{BodyBuildError, BuiltBody, build_body};
pub use persistence::{
    InMemoryStore, JsonFileStore, StoreWatcher, WATCH_DEBOUNCE, WORKSPACE_FILE, default_data_dir,
};
pub use rewrite::{HeaderRuleTable, RewriteHandle, RewriteWorker, rewrite_channel};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
