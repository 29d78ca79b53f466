//! Captured traffic records
//!
//! Logged requests arrive from a passive capture and are read-only here;
//! the only thing the workspace does with one is convert it into an
//! editable request.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A form field value as captured; multi-valued fields keep every value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    /// A single value.
    Single(String),
    /// Every value submitted under the field name.
    Many(Vec<String>),
}

impl FormValue {
    /// Returns the value used when the field becomes a single row.
    #[must_use]
    pub fn first(&self) -> &str {
        match self {
            Self::Single(value) => value,
            Self::Many(values) => values.first().map_or("", String::as_str),
        }
    }
}

/// The body of a captured request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoggedBody {
    /// Raw body text.
    Text(String),
    /// Parsed form fields, in capture order.
    Form(IndexMap<String, FormValue>),
}

/// One passively captured network request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedRequest {
    /// Unique identifier of the capture.
    pub id: String,
    /// Full request URL.
    pub url: String,
    /// Method as captured; may be a verb the editor does not model.
    pub method: String,
    /// Response status, if the capture saw one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// When the request was captured.
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,
    /// Request headers in capture order, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<IndexMap<String, String>>,
    /// Request body, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<LoggedBody>,
}

impl LoggedRequest {
    /// Creates a bare capture record for the given method and URL.
    #[must_use]
    pub fn new(id: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            method: method.into(),
            status: None,
            timestamp: Utc::now(),
            request_headers: None,
            request_body: None,
        }
    }

    /// Returns true if the URL or method contains `needle`, ignoring case.
    ///
    /// An empty needle matches everything.
    #[must_use]
    pub fn matches_filter(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.url.to_lowercase().contains(&needle) || self.method.to_lowercase().contains(&needle)
    }
}

/// Timestamps are stored as epoch milliseconds. Captures may record them
/// as fractional numbers, which are truncated on read.
mod timestamp_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(timestamp.timestamp_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = f64::deserialize(deserializer)?;
        #[allow(clippy::cast_possible_truncation)]
        DateTime::from_timestamp_millis(millis as i64)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}")))
    }
}
