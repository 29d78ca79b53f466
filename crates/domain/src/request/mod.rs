//! Request entity and its building blocks

mod body;
mod header;
mod key_value;
mod method;
mod query;
mod spec;

pub use body::{BodyType, RawBodyType};
pub use header::{
    FORBIDDEN_HEADERS, FORBIDDEN_PREFIXES, HeaderPair, HeaderPlan, classify_headers, is_forbidden,
    rewrite_rules,
};
pub use key_value::{FieldKind, FileAttachment, KeyValue, active};
pub use method::HttpMethod;
pub use query::{
    normalize_query, params_for_url, params_to_query_string, query_string_to_params, split_url,
    url_with_params,
};
pub use spec::{DEFAULT_REQUEST_NAME, HttpRequest};
