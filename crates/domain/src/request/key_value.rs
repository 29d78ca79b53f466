//! Editable key/value rows shared by headers, query params and form fields.

use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// How a form field row is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// The value is sent as text.
    #[default]
    Text,
    /// The row carries an attached file.
    File,
}

/// A file picked for a multipart form field.
///
/// Attachments live only in memory; they are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// Original file name, sent as the part's filename.
    pub file_name: String,
    /// MIME type recorded when the file was picked, if any.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    /// Creates an attachment with no recorded MIME type.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }
}

/// One header, query parameter or form field row.
///
/// `id` is the only identity of a row. It is assigned once and survives
/// edits to `key` and `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Stable row identifier
    pub id: String,
    /// Row key (header name, parameter name, field name)
    pub key: String,
    /// Row value
    pub value: String,
    /// Disabled rows are kept but never serialized
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Field kind, only meaningful for form-data rows
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
    /// Attached file for `file` rows
    #[serde(skip)]
    pub file: Option<FileAttachment>,
}

const fn default_enabled() -> bool {
    true
}

impl KeyValue {
    /// Creates a new enabled text row with a fresh id.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            key: key.into(),
            value: value.into(),
            enabled: true,
            kind: None,
            file: None,
        }
    }

    /// Creates a disabled row with a fresh id.
    #[must_use]
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(key, value)
        }
    }

    /// Creates a file row carrying the given attachment.
    #[must_use]
    pub fn file(key: impl Into<String>, attachment: FileAttachment) -> Self {
        Self {
            value: attachment.file_name.clone(),
            kind: Some(FieldKind::File),
            file: Some(attachment),
            ..Self::new(key, "")
        }
    }

    /// Returns true if the row takes part in serialization.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.key.is_empty()
    }

    /// Returns true if this is a file row with an attachment.
    #[must_use]
    pub const fn has_file(&self) -> bool {
        matches!(self.kind, Some(FieldKind::File)) && self.file.is_some()
    }

    /// Returns a copy of this row under a fresh id.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: generate_id(),
            ..self.clone()
        }
    }
}

/// Iterates the rows that take part in serialization.
pub fn active(rows: &[KeyValue]) -> impl Iterator<Item = &KeyValue> {
    rows.iter().filter(|row| row.is_active())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_active_rows_skip_disabled_and_blank_keys() {
        let rows = vec![
            KeyValue::new("a", "1"),
            KeyValue::disabled("b", "2"),
            KeyValue::new("", "3"),
        ];
        let keys: Vec<_> = active(&rows).map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn test_duplicate_gets_new_id() {
        let row = KeyValue::new("a", "1");
        let copy = row.duplicate();
        assert_ne!(row.id, copy.id);
        assert_eq!(row.key, copy.key);
    }

    #[test]
    fn test_file_attachment_is_not_serialized() {
        let row = KeyValue::file("upload", FileAttachment::new("a.png", vec![1, 2, 3]));
        assert!(row.has_file());

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"type\":\"file\""));

        let back: KeyValue = serde_json::from_str(&json).unwrap();
        assert!(back.file.is_none());
        assert!(!back.has_file());
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let row: KeyValue = serde_json::from_str(r#"{"id":"x","key":"k","value":"v"}"#).unwrap();
        assert!(row.enabled);
    }
}
