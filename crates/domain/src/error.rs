//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request body is invalid for the requested operation.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// The text could not be understood as a curl command.
    #[error("invalid curl command: {0}")]
    InvalidCurl(String),

    /// A persisted value does not have the expected shape.
    #[error("invalid stored value for `{key}`: {message}")]
    InvalidStoredValue {
        /// The storage key that held the value.
        key: String,
        /// What went wrong while decoding it.
        message: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
