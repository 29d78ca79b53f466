//! Execute Request Use Case
//!
//! Sends one request through the header-rewrite workaround:
//!
//! 1. partition the headers and install override rules for all of them,
//!    waiting for the service to acknowledge;
//! 2. materialize the body (skipped for `GET`/`HEAD`);
//! 3. dispatch and time the call up to the end of the response body;
//! 4. build the response;
//! 5. clear the override rules, whatever happened above.
//!
//! The rewrite service keeps a single rule table, so steps 1 to 5 run under
//! one lock shared by every clone: a send never dispatches under another
//! send's rules, and another send's clear never lands before its dispatch.

use std::sync::Arc;

use courier_domain::{
    BodyType, HeaderPlan, HttpRequest, HttpResponse, RequestState, classify_headers,
    flatten_headers, request::rewrite_rules,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::ports::{
    HeaderRewriteService, HttpTransport, MessagingError, MultipartField, MultipartValue,
    RewriteMessage, TransportBody, TransportError, TransportRequest,
};

/// Content type given to url-encoded form bodies that do not name one.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Result type for request execution.
pub type ExecuteResult = Result<HttpResponse, ExecuteRequestError>;

/// Error type for the execute request use case.
#[derive(Debug, Clone, Error)]
pub enum ExecuteRequestError {
    /// URL is empty.
    #[error("URL is required")]
    EmptyUrl,

    /// The override rules could not be installed.
    #[error("{0}")]
    Messaging(#[from] MessagingError),

    /// The body could not be materialized.
    #[error("Invalid request body: {0}")]
    Body(String),

    /// The network call failed.
    #[error("{0}")]
    Transport(#[from] TransportError),
}

impl ExecuteRequestError {
    /// Converts this error to a `RequestState::Failed` for display.
    #[must_use]
    pub fn to_request_state(&self) -> RequestState {
        RequestState::failed(self.to_string())
    }
}

/// Extension trait for convenient `RequestState` conversion.
pub trait ExecuteResultExt {
    /// Converts the result to the tab state it settles into.
    fn to_request_state(self) -> RequestState;
}

impl ExecuteResultExt for ExecuteResult {
    fn to_request_state(self) -> RequestState {
        match self {
            Ok(response) => RequestState::success(response),
            Err(e) => e.to_request_state(),
        }
    }
}

/// Use case for executing HTTP requests.
///
/// Cheap to clone; clones share the same services and the rewrite lock.
#[derive(Clone)]
pub struct ExecuteRequest {
    messaging: Arc<dyn HeaderRewriteService>,
    transport: Arc<dyn HttpTransport>,
    rewrite_window: Arc<Mutex<()>>,
}

impl ExecuteRequest {
    /// Creates the use case over the given rewrite service and transport.
    pub fn new(messaging: Arc<dyn HeaderRewriteService>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            messaging,
            transport,
            rewrite_window: Arc::new(Mutex::new(())),
        }
    }

    /// Executes the request and returns the response or the failure.
    ///
    /// The rule-clearing message is sent exactly once, on every path.
    pub async fn execute(&self, request: &HttpRequest) -> ExecuteResult {
        let _window = self.rewrite_window.lock().await;
        let result = self.run(request).await;

        if let Err(err) = self.messaging.send(RewriteMessage::ClearRequestHeaders).await {
            warn!(error = %err, "failed to clear header rewrite rules");
        }
        result
    }

    async fn run(&self, request: &HttpRequest) -> ExecuteResult {
        if request.url.trim().is_empty() {
            return Err(ExecuteRequestError::EmptyUrl);
        }

        let mut plan = classify_headers(&request.headers);
        let mut rules = rewrite_rules(&request.headers);
        if request.method.carries_body() && request.body_type == BodyType::FormData {
            rules.retain(|rule| !rule.is_named("Content-Type"));
        }
        debug!(
            url = %request.url,
            rules = rules.len(),
            forbidden = plan.forbidden.len(),
            "installing header rewrite rules"
        );
        self.messaging
            .send(RewriteMessage::SetRequestHeaders {
                url: request.url.clone(),
                headers: rules,
            })
            .await?;

        let body = materialize_body(request, &mut plan)?;

        let started = Instant::now();
        let response = self
            .transport
            .dispatch(TransportRequest {
                method: request.method,
                url: request.url.clone(),
                headers: plan.safe,
                body,
                include_credentials: true,
            })
            .await?;
        let elapsed = started.elapsed();

        Ok(HttpResponse {
            status: response.status,
            status_text: response.status_text,
            headers: flatten_headers(response.headers),
            size: response.body.len() as u64,
            body: String::from_utf8_lossy(&response.body).into_owned(),
            time: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

/// Builds the body for `request`, adjusting the safe headers it implies.
///
/// * url-encoded forms default the Content-Type when none was given;
/// * multipart bodies drop any manual Content-Type so the transport's
///   boundary is used.
///
/// # Errors
///
/// Returns [`ExecuteRequestError::Body`] if the form cannot be encoded.
pub fn materialize_body(
    request: &HttpRequest,
    plan: &mut HeaderPlan,
) -> Result<TransportBody, ExecuteRequestError> {
    if !request.method.carries_body() {
        return Ok(TransportBody::Empty);
    }

    let fields = || courier_domain::request::active(&request.body_form);
    match request.body_type {
        BodyType::None => Ok(TransportBody::Empty),
        BodyType::Raw => Ok(TransportBody::Text(request.body_raw.clone())),
        BodyType::FormUrlEncoded => {
            let pairs: Vec<(&str, &str)> = fields()
                .map(|f| (f.key.as_str(), f.value.as_str()))
                .collect();
            let encoded = serde_urlencoded::to_string(pairs)
                .map_err(|e| ExecuteRequestError::Body(e.to_string()))?;
            if !plan.has_safe("Content-Type") {
                plan.safe.push(courier_domain::HeaderPair::new(
                    "Content-Type",
                    FORM_URLENCODED,
                ));
            }
            Ok(TransportBody::Text(encoded))
        }
        BodyType::FormData => {
            plan.remove_safe("Content-Type");
            let parts = fields()
                .map(|f| MultipartField {
                    name: f.key.clone(),
                    value: match (&f.file, f.has_file()) {
                        (Some(file), true) => MultipartValue::File(file.clone()),
                        _ => MultipartValue::Text(f.value.clone()),
                    },
                })
                .collect();
            Ok(TransportBody::Multipart(parts))
        }
    }
}
