//! The editable HTTP request entity

use serde::{Deserialize, Serialize};

use super::{
    BodyType, HttpMethod, KeyValue, RawBodyType, normalize_query, params_for_url,
    params_to_query_string, split_url, url_with_params,
};
use crate::error::{DomainError, DomainResult};
use crate::id::generate_id;

/// Name given to requests created from the blank template.
pub const DEFAULT_REQUEST_NAME: &str = "New Request";

/// A saved or in-progress HTTP request.
///
/// `params` always mirrors the query string of `url`; use [`set_url`] and
/// [`set_params`] to edit either side so the other is re-derived.
///
/// [`set_url`]: HttpRequest::set_url
/// [`set_params`]: HttpRequest::set_params
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    /// Unique identifier; also the id of the request's tab
    pub id: String,
    /// Owning collection, unset for root requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    /// Human-readable name
    pub name: String,
    /// Target URL including its query string
    #[serde(default)]
    pub url: String,
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Header rows
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    /// Query parameter rows, projected from `url`
    #[serde(default)]
    pub params: Vec<KeyValue>,
    /// Which body editor is in use
    #[serde(default)]
    pub body_type: BodyType,
    /// Raw body text
    #[serde(default)]
    pub body_raw: String,
    /// Syntax hint for the raw body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_raw_type: Option<RawBodyType>,
    /// Form rows for `form-data` and `x-www-form-urlencoded` bodies
    #[serde(default)]
    pub body_form: Vec<KeyValue>,
}

impl HttpRequest {
    /// Creates a blank `GET` request with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            collection_id: None,
            name: DEFAULT_REQUEST_NAME.to_string(),
            url: String::new(),
            method: HttpMethod::Get,
            headers: Vec::new(),
            params: Vec::new(),
            body_type: BodyType::None,
            body_raw: String::new(),
            body_raw_type: None,
            body_form: Vec::new(),
        }
    }

    /// Creates a request for the given method and URL, deriving its params.
    #[must_use]
    pub fn with_url(method: HttpMethod, url: impl Into<String>) -> Self {
        let mut request = Self {
            method,
            ..Self::new()
        };
        request.set_url(url);
        request
    }

    /// Replaces the URL and re-derives the parameter rows from it.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.params = params_for_url(&self.url, &self.params);
    }

    /// Replaces the parameter rows and rebuilds the URL's query string.
    pub fn set_params(&mut self, params: Vec<KeyValue>) {
        self.url = url_with_params(&self.url, &params);
        self.params = params;
    }

    /// Returns true if `params` agrees with the query string of `url`.
    #[must_use]
    pub fn params_in_sync(&self) -> bool {
        let query = split_url(&self.url).1.unwrap_or_default();
        params_to_query_string(&self.params) == normalize_query(query)
    }

    /// Returns a copy under a fresh id named `"<name> Copy"`.
    ///
    /// Every row gets a fresh id as well; the copy stays in the same
    /// collection as the original.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: generate_id(),
            name: format!("{} Copy", self.name),
            headers: self.headers.iter().map(KeyValue::duplicate).collect(),
            params: self.params.iter().map(KeyValue::duplicate).collect(),
            body_form: self.body_form.iter().map(KeyValue::duplicate).collect(),
            ..self.clone()
        }
    }

    /// Re-indents the raw body as JSON with two spaces.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBody`] if the raw body is not valid
    /// JSON; the request is left untouched.
    pub fn format_json_body(&mut self) -> DomainResult<()> {
        let value: serde_json::Value = serde_json::from_str(&self.body_raw)
            .map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        self.body_raw = serde_json::to_string_pretty(&value)
            .map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        Ok(())
    }
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_request_template() {
        let req = HttpRequest::new();
        assert_eq!(req.name, "New Request");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.body_type, BodyType::None);
        assert!(req.url.is_empty());
        assert!(req.collection_id.is_none());
    }

    #[test]
    fn test_url_and_params_stay_in_sync() {
        let mut req = HttpRequest::new();
        req.set_url("https://api.example.com/users?id=1");
        assert_eq!(req.params.len(), 1);
        assert_eq!(req.params[0].key, "id");
        assert_eq!(req.params[0].value, "1");
        assert!(req.params[0].enabled);

        let mut params = req.params.clone();
        params[0].value = "2".to_string();
        req.set_params(params);
        assert_eq!(req.url, "https://api.example.com/users?id=2");
        assert!(req.params_in_sync());
    }

    #[test]
    fn test_param_id_survives_url_edit() {
        let mut req = HttpRequest::with_url(HttpMethod::Get, "https://x.com/?page=1");
        let id = req.params[0].id.clone();
        req.set_url("https://x.com/?page=7");
        assert_eq!(req.params[0].id, id);
        assert_eq!(req.params[0].value, "7");
    }

    #[test]
    fn test_duplicate() {
        let mut req = HttpRequest::with_url(HttpMethod::Post, "https://x.com/?a=1");
        req.name = "Create user".to_string();
        req.collection_id = Some("c1".to_string());
        req.headers.push(KeyValue::new("Accept", "*/*"));

        let copy = req.duplicate();
        assert_ne!(copy.id, req.id);
        assert_eq!(copy.name, "Create user Copy");
        assert_eq!(copy.collection_id.as_deref(), Some("c1"));
        assert_ne!(copy.headers[0].id, req.headers[0].id);
        assert_ne!(copy.params[0].id, req.params[0].id);
        assert_eq!(copy.url, req.url);
    }

    #[test]
    fn test_format_json_body() {
        let mut req = HttpRequest::new();
        req.body_raw = r#"{"b":1,"a":[true,null]}"#.to_string();
        req.format_json_body().unwrap();
        assert_eq!(req.body_raw, "{\n  \"b\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}");
    }

    #[test]
    fn test_format_invalid_json_leaves_body() {
        let mut req = HttpRequest::new();
        req.body_raw = "{not json".to_string();
        let err = req.format_json_body().unwrap_err();
        assert!(matches!(err, DomainError::InvalidBody(_)));
        assert_eq!(req.body_raw, "{not json");
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let mut req = HttpRequest::new();
        req.collection_id = Some("c1".to_string());
        req.body_type = BodyType::FormUrlEncoded;
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["collectionId"], "c1");
        assert_eq!(json["bodyType"], "x-www-form-urlencoded");
        assert!(json.get("bodyRawType").is_none());
    }
}
