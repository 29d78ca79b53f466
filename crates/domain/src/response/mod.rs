//! HTTP response types

mod spec;

pub use spec::{HttpResponse, flatten_headers};
