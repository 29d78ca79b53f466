//! Conversion of captured traffic and curl commands into requests.
//!
//! Everything here is pure: the same input always yields the same request
//! shape (apart from freshly generated row ids).

use url::Url;

use crate::history::{LoggedBody, LoggedRequest};
use crate::id::generate_id;
use crate::request::{
    BodyType, FieldKind, HeaderPair, HttpMethod, HttpRequest, KeyValue, query_string_to_params,
    split_url,
};

/// Name given to an imported curl command whose URL yields no better one.
pub const IMPORTED_REQUEST_NAME: &str = "Imported Request";

/// Body recovered from a curl command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedBody {
    /// Raw `--data` text.
    Raw(String),
    /// `--form` fields, in command order.
    Form(Vec<(String, String)>),
}

/// The fields a curl parser could recover from a command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRequestFields {
    /// Target URL.
    pub url: Option<String>,
    /// Explicit or implied method.
    pub method: Option<HttpMethod>,
    /// Headers in command order.
    pub headers: Vec<HeaderPair>,
    /// Request body.
    pub body: Option<ParsedBody>,
}

/// Derives a display name from a URL.
///
/// The root path yields the origin, any other path yields the path itself.
/// Text that does not parse as an absolute URL is returned unchanged.
#[must_use]
pub fn derive_name(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if parsed.path() == "/" => parsed.origin().ascii_serialization(),
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    }
}

/// Converts a captured request into an editable one.
///
/// The request keeps the capture's id, so opening the same capture twice
/// lands on the same tab.
#[must_use]
pub fn log_to_request(log: &LoggedRequest) -> HttpRequest {
    let headers = log
        .request_headers
        .iter()
        .flatten()
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
        .collect();

    let (body_type, body_raw, body_form) = match &log.request_body {
        Some(LoggedBody::Text(text)) => (BodyType::Raw, text.clone(), Vec::new()),
        Some(LoggedBody::Form(fields)) => {
            let rows = fields
                .iter()
                .map(|(key, value)| KeyValue {
                    kind: Some(FieldKind::Text),
                    ..KeyValue::new(key.clone(), value.first())
                })
                .collect();
            (BodyType::FormData, String::new(), rows)
        }
        None => (BodyType::None, String::new(), Vec::new()),
    };

    HttpRequest {
        id: log.id.clone(),
        name: derive_name(&log.url),
        url: log.url.clone(),
        method: HttpMethod::from_captured(&log.method),
        headers,
        params: query_string_to_params(split_url(&log.url).1.unwrap_or_default()),
        body_type,
        body_raw,
        body_form,
        ..HttpRequest::new()
    }
}

/// Builds a new request from parsed curl fields over the blank template.
#[must_use]
pub fn curl_fields_to_request(fields: ParsedRequestFields) -> HttpRequest {
    let mut request = HttpRequest {
        id: generate_id(),
        name: fields
            .url
            .as_deref()
            .map_or_else(|| IMPORTED_REQUEST_NAME.to_string(), derive_name),
        method: fields.method.unwrap_or_default(),
        headers: fields
            .headers
            .into_iter()
            .map(|pair| KeyValue::new(pair.key, pair.value))
            .collect(),
        ..HttpRequest::new()
    };

    match fields.body {
        Some(ParsedBody::Raw(text)) => {
            request.body_type = BodyType::Raw;
            request.body_raw = text;
        }
        Some(ParsedBody::Form(pairs)) => {
            request.body_type = BodyType::FormData;
            request.body_form = pairs
                .into_iter()
                .map(|(key, value)| KeyValue {
                    kind: Some(FieldKind::Text),
                    ..KeyValue::new(key, value)
                })
                .collect();
        }
        None => {}
    }

    if let Some(url) = fields.url {
        request.set_url(url);
    }
    request
}
