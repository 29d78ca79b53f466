//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod curl;
mod http_transport;
mod messaging;
mod storage;

pub use curl::CurlCodec;
pub use http_transport::{
    HttpTransport, MultipartField, MultipartValue, TransportBody, TransportError,
    TransportRequest, TransportResponse,
};
pub use messaging::{HeaderRewriteService, MessagingError, RewriteMessage};
pub use storage::{
    KeyValueStore, StorageChange, StorageDelta, StorageError, delta_for_removal, delta_for_write,
    delta_values,
};
