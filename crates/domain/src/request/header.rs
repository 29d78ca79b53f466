//! Header pairs and the forbidden-header policy.

use serde::{Deserialize, Serialize};

use super::key_value::{KeyValue, active};

/// Header names the transport refuses to set directly.
pub const FORBIDDEN_HEADERS: &[&str] = &[
    "cookie",
    "cookie2",
    "origin",
    "referer",
    "host",
    "connection",
    "content-length",
    "date",
    "expect",
    "keep-alive",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "via",
];

/// Name prefixes that are forbidden regardless of the rest of the name.
pub const FORBIDDEN_PREFIXES: &[&str] = &["sec-", "proxy-"];

/// A plain header name/value pair as it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderPair {
    /// Header name
    pub key: String,
    /// Header value
    pub value: String,
}

impl HeaderPair {
    /// Creates a new header pair.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns true if the pair's name matches `name` case-insensitively.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name)
    }
}

impl From<&KeyValue> for HeaderPair {
    fn from(row: &KeyValue) -> Self {
        Self::new(row.key.clone(), row.value.clone())
    }
}

/// Returns true if the transport will not let a client set `name` itself.
#[must_use]
pub fn is_forbidden(name: &str) -> bool {
    let lower = name.trim().to_ascii_lowercase();
    FORBIDDEN_HEADERS.contains(&lower.as_str())
        || FORBIDDEN_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
}

/// The result of partitioning a request's headers for dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderPlan {
    /// Headers the transport accepts; passed directly.
    pub safe: Vec<HeaderPair>,
    /// Headers only the rewrite service can install.
    pub forbidden: Vec<HeaderPair>,
}

impl HeaderPlan {
    /// Returns true if a safe header with this name is present.
    #[must_use]
    pub fn has_safe(&self, name: &str) -> bool {
        self.safe.iter().any(|pair| pair.is_named(name))
    }

    /// Removes every safe header with this name.
    pub fn remove_safe(&mut self, name: &str) {
        self.safe.retain(|pair| !pair.is_named(name));
    }
}

/// Every active header in original order, as sent to the rewrite service.
#[must_use]
pub fn rewrite_rules(rows: &[KeyValue]) -> Vec<HeaderPair> {
    active(rows).map(HeaderPair::from).collect()
}

/// Partitions the active header rows into safe and forbidden sets.
///
/// Every enabled row with a non-empty key lands in exactly one set.
#[must_use]
pub fn classify_headers(rows: &[KeyValue]) -> HeaderPlan {
    let (forbidden, safe) = active(rows)
        .map(HeaderPair::from)
        .partition(|pair| is_forbidden(&pair.key));
    HeaderPlan { safe, forbidden }
}
