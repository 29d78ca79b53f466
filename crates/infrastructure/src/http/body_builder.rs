//! HTTP request body builder.
//!
//! Turns the pipeline's materialized [`TransportBody`] into something
//! reqwest can send.

use courier_application::ports::{MultipartField, MultipartValue, TransportBody};
use courier_domain::FileAttachment;
use reqwest::multipart::{Form, Part};

/// Error type for body building operations.
#[derive(Debug, thiserror::Error)]
pub enum BodyBuildError {
    /// A file part carried a content type reqwest would not accept.
    #[error("Invalid MIME type for {file_name}: {message}")]
    InvalidMime {
        /// File the part was built from.
        file_name: String,
        /// Underlying parser message.
        message: String,
    },
}

/// Result of building a body.
#[derive(Debug)]
pub enum BuiltBody {
    /// No body.
    None,
    /// A text body sent verbatim.
    Text(String),
    /// Multipart form data; reqwest sets the Content-Type and boundary.
    Multipart(Form),
}

impl BuiltBody {
    /// Returns true for a multipart form.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// Builds the reqwest body for a materialized request body.
///
/// # Errors
///
/// Returns an error if a file part's MIME type is malformed.
pub fn build_body(body: TransportBody) -> Result<BuiltBody, BodyBuildError> {
    match body {
        TransportBody::Empty => Ok(BuiltBody::None),
        TransportBody::Text(content) => Ok(BuiltBody::Text(content)),
        TransportBody::Multipart(fields) => build_multipart_form(fields).map(BuiltBody::Multipart),
    }
}

/// Build a multipart form from materialized fields.
fn build_multipart_form(fields: Vec<MultipartField>) -> Result<Form, BodyBuildError> {
    let mut form = Form::new();

    for field in fields {
        match field.value {
            MultipartValue::Text(value) => {
                form = form.text(field.name, value);
            }
            MultipartValue::File(attachment) => {
                let mime_type = content_type_for(&attachment);
                let part = Part::bytes(attachment.bytes)
                    .file_name(attachment.file_name.clone())
                    .mime_str(&mime_type)
                    .map_err(|e| BodyBuildError::InvalidMime {
                        file_name: attachment.file_name,
                        message: e.to_string(),
                    })?;
                form = form.part(field.name, part);
            }
        }
    }

    Ok(form)
}

/// The recorded content type, else one guessed from the file name.
#[must_use]
pub fn content_type_for(attachment: &FileAttachment) -> String {
    attachment
        .content_type
        .as_deref()
        .filter(|ct| !ct.trim().is_empty())
        .map_or_else(
            || {
                mime_guess::from_path(&attachment.file_name)
                    .first_or(mime::APPLICATION_OCTET_STREAM)
                    .to_string()
            },
            str::to_string,
        )
}
