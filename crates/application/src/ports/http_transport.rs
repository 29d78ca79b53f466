//! HTTP transport port

use async_trait::async_trait;
use courier_domain::{FileAttachment, HeaderPair, HttpMethod};

/// Transport-level failures. A response with any status code is not one
/// of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The host name did not resolve.
    #[error("Could not resolve host {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying resolver message.
        message: String,
    },

    /// The server refused the connection.
    #[error("Connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection failed for another reason (TLS included).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The transport's own time limit elapsed.
    #[error("Request timed out")]
    Timeout,

    /// The redirect limit was exceeded.
    #[error("Too many redirects (max {max})")]
    TooManyRedirects {
        /// Configured limit.
        max: usize,
    },

    /// The request body could not be built.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    ResponseBody(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// One field of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartValue {
    /// A text field.
    Text(String),
    /// A file field.
    File(FileAttachment),
}

/// A named multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: MultipartValue,
}

/// The materialized request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransportBody {
    /// No body.
    #[default]
    Empty,
    /// A text body sent verbatim.
    Text(String),
    /// A multipart body; the transport picks the boundary and Content-Type.
    Multipart(Vec<MultipartField>),
}

/// Everything the transport needs to issue one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Target URL.
    pub url: String,
    /// Headers the transport may set directly.
    pub headers: Vec<HeaderPair>,
    /// Request body.
    pub body: TransportBody,
    /// Whether ambient credentials (cookies) are attached.
    pub include_credentials: bool,
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase.
    pub status_text: String,
    /// Headers in arrival order; names may repeat.
    pub headers: Vec<(String, String)>,
    /// Body bytes as transmitted.
    pub body: Vec<u8>,
}

/// Port for issuing HTTP requests.
///
/// Implementations resolve only after the whole response body is read.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and reads the full response.
    ///
    /// # Errors
    /// Returns a [`TransportError`] for network-level failures only.
    async fn dispatch(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
