//! Adapters implementing the application layer ports.

mod reqwest_transport;

pub use reqwest_transport::{DEFAULT_MAX_REDIRECTS, ReqwestTransport, TransportConfig};
