//! Per-tab request execution state.
//!
//! `Loading`, `Success` and `Failed` are mutually exclusive: entering
//! `Loading` drops whatever result the previous send produced.

use serde::{Deserialize, Serialize};

use crate::response::HttpResponse;

/// Message shown when a failed send carries no description of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred";

/// Execution state of a request tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    /// Nothing sent yet.
    #[default]
    Idle,

    /// A send is in flight.
    Loading,

    /// The last send produced a response (any status code).
    Success {
        /// The response data.
        response: Box<HttpResponse>,
    },

    /// The last send failed at the transport level.
    Failed {
        /// Human-readable error message.
        message: String,
    },
}

impl RequestState {
    /// Creates a Success state from a response.
    #[must_use]
    pub fn success(response: HttpResponse) -> Self {
        Self::Success {
            response: Box::new(response),
        }
    }

    /// Creates a Failed state, substituting the generic message for a
    /// blank one.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        };
        Self::Failed { message }
    }

    /// Returns true if the state is Idle.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a request is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the response if in Success state.
    #[must_use]
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::Success { response } => Some(response),
            _ => None,
        }
    }

    /// Returns the error message if in Failed state.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Returns the state a restored tab should start in.
    ///
    /// A send cannot survive a restart, so `Loading` comes back as `Idle`.
    #[must_use]
    pub fn restored(self) -> Self {
        match self {
            Self::Loading => Self::Idle,
            other => other,
        }
    }
}
