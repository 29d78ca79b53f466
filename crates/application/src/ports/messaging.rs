//! Header-rewrite service port
//!
//! The transport will not let a client set certain headers itself. A
//! privileged component installs override rules for them instead; this
//! port is how the pipeline talks to it.

use async_trait::async_trait;
use courier_domain::HeaderPair;
use serde::{Deserialize, Serialize};

/// Errors that can occur while talking to the rewrite service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MessagingError {
    /// The service is not running.
    #[error("header rewrite service is unavailable")]
    Disconnected,

    /// The service received the message but did not acknowledge it.
    #[error("header rewrite service did not acknowledge: {0}")]
    NotAcknowledged(String),
}

/// A message to the header-rewrite service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewriteMessage {
    /// Install (replacing any previous) override rules for `url`.
    SetRequestHeaders {
        /// Exact URL the rules apply to.
        url: String,
        /// Headers to force onto the outgoing request.
        headers: Vec<HeaderPair>,
    },
    /// Remove every installed rule. Safe to send with none installed.
    ClearRequestHeaders,
}

/// Port for the privileged header-rewrite service.
#[async_trait]
pub trait HeaderRewriteService: Send + Sync {
    /// Delivers a message and waits for the service to acknowledge it.
    ///
    /// # Errors
    /// Returns an error if the service is gone or does not acknowledge.
    async fn send(&self, message: RewriteMessage) -> Result<(), MessagingError>;
}
