//! Application error types

use courier_domain::DomainError;
use thiserror::Error;

use crate::ports::{MessagingError, StorageError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The header-rewrite service could not be reached.
    #[error("messaging error: {0}")]
    Messaging(#[from] MessagingError),

    /// User input was rejected; nothing was changed.
    #[error("{0}")]
    Validation(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
