//! Request body type selection

use serde::{Deserialize, Serialize};

/// Which editor the request body is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BodyType {
    /// No body
    #[default]
    #[serde(rename = "none")]
    None,
    /// Raw text body, sent verbatim
    #[serde(rename = "raw")]
    Raw,
    /// Multipart form data
    #[serde(rename = "form-data")]
    FormData,
    /// Percent-encoded `key=value&...` form
    #[serde(rename = "x-www-form-urlencoded")]
    FormUrlEncoded,
}

impl BodyType {
    /// Returns the wire name of this body type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Raw => "raw",
            Self::FormData => "form-data",
            Self::FormUrlEncoded => "x-www-form-urlencoded",
        }
    }
}

/// Hint for the raw body editor's syntax mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RawBodyType {
    /// JSON text
    #[default]
    Json,
    /// Plain text
    Text,
}
