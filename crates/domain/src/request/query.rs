//! Projection between a URL's query string and its parameter rows.
//!
//! Both directions use `application/x-www-form-urlencoded` rules, so a
//! query string read into rows and written back comes out normalized
//! (`+` for spaces, reserved characters percent-encoded, empty pairs
//! dropped).

use url::form_urlencoded;

use super::key_value::{KeyValue, active};

/// Splits a URL at its first `?` into the base and the raw query string.
#[must_use]
pub fn split_url(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    }
}

/// Parses a query string (with or without a leading `?`) into enabled rows.
#[must_use]
pub fn query_string_to_params(query: &str) -> Vec<KeyValue> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| KeyValue::new(key, value))
        .collect()
}

/// Serializes the active rows into a query string without a leading `?`.
#[must_use]
pub fn params_to_query_string(params: &[KeyValue]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for param in active(params) {
        serializer.append_pair(&param.key, &param.value);
    }
    serializer.finish()
}

/// Rebuilds `url` with its query string replaced by the given rows.
#[must_use]
pub fn url_with_params(url: &str, params: &[KeyValue]) -> String {
    let (base, _) = split_url(url);
    let query = params_to_query_string(params);
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// Re-derives parameter rows after the URL text changed.
///
/// Rows keep their ids when a parsed pair matches an existing enabled row
/// with the same key (first unused match wins). Disabled rows are not part
/// of the query string and are carried over unchanged after the parsed ones.
#[must_use]
pub fn params_for_url(url: &str, previous: &[KeyValue]) -> Vec<KeyValue> {
    let parsed = split_url(url)
        .1
        .map(query_string_to_params)
        .unwrap_or_default();

    let mut claimed = vec![false; previous.len()];
    let mut rows: Vec<KeyValue> = parsed
        .into_iter()
        .map(|mut row| {
            let reuse = previous
                .iter()
                .enumerate()
                .position(|(i, old)| !claimed[i] && old.enabled && old.key == row.key);
            if let Some(i) = reuse {
                claimed[i] = true;
                row.id.clone_from(&previous[i].id);
            }
            row
        })
        .collect();

    rows.extend(previous.iter().filter(|old| !old.enabled).cloned());
    rows
}

/// Normalizes a query string by reading it into rows and writing it back.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    params_to_query_string(&query_string_to_params(query))
}
