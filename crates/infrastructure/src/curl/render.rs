//! Request → curl command line.

use courier_domain::request::active;
use courier_domain::{BodyType, HttpMethod, HttpRequest, KeyValue};

/// Formats a request as a multi-line curl command.
///
/// Only enabled headers and form rows are emitted, and a body is written
/// only for methods that carry one.
#[must_use]
pub fn render_curl(request: &HttpRequest) -> String {
    let mut parts = vec!["curl".to_string()];

    match request.method {
        HttpMethod::Get => {}
        HttpMethod::Head => parts.push("-I".to_string()),
        method => parts.push(format!("-X {method}")),
    }
    parts.push(quote(&request.url));

    for header in active(&request.headers) {
        parts.push(format!("-H {}", quote(&format!("{}: {}", header.key, header.value))));
    }

    if request.method.carries_body() {
        match request.body_type {
            BodyType::None => {}
            BodyType::Raw => {
                if !request.body_raw.is_empty() {
                    parts.push(format!("--data-raw {}", quote(&request.body_raw)));
                }
            }
            BodyType::FormUrlEncoded => {
                for field in active(&request.body_form) {
                    parts.push(format!(
                        "--data-urlencode {}",
                        quote(&format!("{}={}", field.key, field.value))
                    ));
                }
            }
            BodyType::FormData => {
                for field in active(&request.body_form) {
                    parts.push(format!("-F {}", quote(&form_field(field))));
                }
            }
        }
    }

    parts.join(" \\\n  ")
}

fn form_field(field: &KeyValue) -> String {
    match &field.file {
        Some(file) if field.has_file() => format!("{}=@{}", field.key, file.file_name),
        _ => format!("{}={}", field.key, field.value),
    }
}

/// Single-quotes a shell word.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
