//! Courier Application - Ports, request execution and session orchestration
//!
//! This crate defines the application layer with:
//! - Port traits for storage, the header-rewrite service, HTTP and curl
//! - The request execution pipeline
//! - The workspace session that keeps state and storage in step

pub mod error;
pub mod execute_request;
pub mod platform;
pub mod ports;
pub mod session;

#[cfg(test)]
mod test_support;

pub use error::{ApplicationError, ApplicationResult};
pub use execute_request::{ExecuteRequest, ExecuteRequestError, ExecuteResult, ExecuteResultExt};
pub use platform::PlatformServices;
pub use ports::{
    CurlCodec, HeaderRewriteService, HttpTransport, KeyValueStore, MessagingError, RewriteMessage,
    StorageDelta, StorageError, TransportError,
};
pub use session::{SendJob, SendOutcome, Subscription, SyncEvent, WorkspaceSession};
