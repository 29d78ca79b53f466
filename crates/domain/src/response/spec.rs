//! Response types
//!
//! A response is produced once per send and replaced wholesale on the
//! next one; nothing here mutates a stored response.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The outcome of one successful send.
///
/// Any status code counts as a response. Only transport failures end up
/// on a tab's error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase sent by the server (may be empty)
    #[serde(default)]
    pub status_text: String,
    /// Response headers, one value per name
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body decoded as text
    #[serde(default)]
    pub body: String,
    /// Wall-clock time from dispatch to end of body, in milliseconds
    pub time: u64,
    /// Byte length of the body as transmitted
    pub size: u64,
}

impl HttpResponse {
    /// Returns true if this is a 2xx response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true if this is a 4xx response.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Returns true if this is a 5xx response.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the body re-indented if it parses as JSON, otherwise verbatim.
    #[must_use]
    pub fn pretty_body(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| self.body.clone())
    }

    /// Returns a human-readable size string (e.g., "1.20 KB").
    #[must_use]
    pub fn size_display(&self) -> String {
        format_bytes(self.size)
    }
}

/// Collapses repeated header names into one comma-joined value per name.
///
/// Names are lowercased, so `Set-Cookie` and `set-cookie` merge.
#[must_use]
pub fn flatten_headers<I, K, V>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in pairs {
        let name = name.as_ref().to_ascii_lowercase();
        map.entry(name)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value.as_ref());
            })
            .or_insert_with(|| value.as_ref().to_string());
    }
    map
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    #[allow(clippy::cast_precision_loss)]
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
