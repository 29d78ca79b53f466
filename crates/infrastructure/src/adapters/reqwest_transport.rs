//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It is also where the
//! forced headers installed by the rewrite service take effect: rules for
//! the exact request URL are applied on top of the request's own headers
//! just before dispatch.

use std::error::Error as _;

use async_trait::async_trait;
use courier_application::ports::{
    HttpTransport, TransportError, TransportRequest, TransportResponse,
};
use courier_domain::{HeaderPair, HttpMethod};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use tracing::debug;

use crate::http::{BuiltBody, build_body};
use crate::rewrite::HeaderRuleTable;

/// Default redirect limit.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Client settings for [`ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// `User-Agent` sent when a request does not force one.
    pub user_agent: String,
    /// Maximum number of redirects followed.
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("Courier/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// HTTP transport implementation using reqwest.
///
/// Holds two clients: one with a cookie store for requests that carry
/// ambient credentials, and one without.
pub struct ReqwestTransport {
    client: Client,
    anonymous: Client,
    rules: HeaderRuleTable,
    max_redirects: usize,
}

impl ReqwestTransport {
    /// Creates a transport that enforces the rules in `rules`.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be created.
    pub fn new(config: &TransportConfig, rules: HeaderRuleTable) -> Result<Self, TransportError> {
        let build = |cookies: bool| {
            Client::builder()
                .user_agent(config.user_agent.clone())
                .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
                .cookie_store(cookies)
                .build()
                .map_err(|e| TransportError::Other(e.to_string()))
        };

        Ok(Self {
            client: build(true)?,
            anonymous: build(false)?,
            rules,
            max_redirects: config.max_redirects,
        })
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
            HttpMethod::Trace => Method::TRACE,
            HttpMethod::Connect => Method::CONNECT,
        }
    }

    /// Builds the outgoing header map: the request's own headers first,
    /// then the forced rules, which replace any header of the same name.
    ///
    /// Multipart bodies drop any `Content-Type` from the result in
    /// `dispatch`, since the boundary comes from the form.
    fn header_map(safe: &[HeaderPair], forced: &[HeaderPair]) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for header in safe {
            let (name, value) = Self::header_parts(header)?;
            map.append(name, value);
        }
        for header in forced {
            let (name, value) = Self::header_parts(header)?;
            map.insert(name, value);
        }
        Ok(map)
    }

    fn header_parts(header: &HeaderPair) -> Result<(HeaderName, HeaderValue), TransportError> {
        let name = HeaderName::from_bytes(header.key.trim().as_bytes())
            .map_err(|e| TransportError::Other(format!("Invalid header name {:?}: {e}", header.key)))?;
        let value = HeaderValue::from_str(&header.value)
            .map_err(|e| TransportError::Other(format!("Invalid value for header {}: {e}", header.key)))?;
        Ok((name, value))
    }

    /// The error's message followed by its sources.
    fn full_message(error: &reqwest::Error) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout;
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_connect() {
            let message = Self::full_message(error);
            let lowered = message.to_lowercase();
            if lowered.contains("dns") || lowered.contains("resolve") {
                return TransportError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lowered.contains("refused") {
                return TransportError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return TransportError::TooManyRedirects {
                max: self.max_redirects,
            };
        }

        if error.is_body() || error.is_decode() {
            return TransportError::ResponseBody(Self::full_message(error));
        }

        TransportError::Other(Self::full_message(error))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn dispatch(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {}", request.url)))?;

        let body = build_body(request.body).map_err(|e| TransportError::InvalidBody(e.to_string()))?;
        let forced = self.rules.rules_for(&request.url);
        let mut headers = Self::header_map(&request.headers, &forced)?;
        if body.is_multipart() {
            headers.remove(CONTENT_TYPE);
        }
        debug!(
            method = %request.method,
            url = %request.url,
            headers = request.headers.len(),
            forced = forced.len(),
            "dispatching request"
        );

        let client = if request.include_credentials {
            &self.client
        } else {
            &self.anonymous
        };
        let mut builder = client
            .request(Self::to_reqwest_method(request.method), url)
            .headers(headers);

        builder = match body {
            BuiltBody::None => builder,
            BuiltBody::Text(content) => builder.body(content),
            BuiltBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;

        let status = response.status();
        let response_headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::ResponseBody(Self::full_message(&e)))?
            .to_vec();

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: response_headers,
            body,
        })
    }
}
