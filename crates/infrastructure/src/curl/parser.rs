//! curl command line → request fields.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use courier_domain::{
    DomainError, DomainResult, HeaderPair, HttpMethod, ParsedBody, ParsedRequestFields,
};
use tracing::debug;
use url::form_urlencoded;

use super::tokenizer::tokenize;

/// Flags that take no argument and do not change the request.
const IGNORED_FLAGS: &[&str] = &[
    "--compressed",
    "-k",
    "--insecure",
    "-L",
    "--location",
    "-s",
    "--silent",
    "-S",
    "--show-error",
    "-v",
    "--verbose",
    "-i",
    "--include",
    "-f",
    "--fail",
    "-g",
    "--globoff",
];

#[derive(Default)]
struct Collected {
    url: Option<String>,
    method: Option<HttpMethod>,
    headers: Vec<HeaderPair>,
    data: Vec<String>,
    form: Vec<(String, String)>,
    head: bool,
    get: bool,
}

/// Parses a curl command line.
///
/// # Errors
///
/// Returns [`DomainError::InvalidCurl`] if the text is not a curl command
/// or names no URL.
pub fn parse_curl(input: &str) -> DomainResult<ParsedRequestFields> {
    let tokens = tokenize(input.trim())?;
    let mut tokens = tokens.into_iter();
    if tokens.next().as_deref() != Some("curl") {
        return Err(DomainError::InvalidCurl("not a curl command".to_string()));
    }

    let mut collected = Collected::default();
    while let Some(token) = tokens.next() {
        let mut value = |flag: &str| {
            tokens
                .next()
                .ok_or_else(|| DomainError::InvalidCurl(format!("{flag} needs a value")))
        };
        match token.as_str() {
            "-X" | "--request" => {
                let method = value(&token)?;
                match method.parse() {
                    Ok(method) => collected.method = Some(method),
                    Err(err) => debug!(error = %err, "keeping the default method"),
                }
            }
            "-H" | "--header" => {
                if let Some(header) = parse_header(&value(&token)?) {
                    collected.headers.push(header);
                }
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii" => {
                collected.data.push(value(&token)?);
            }
            "--data-urlencode" => collected.data.push(urlencode_data(&value(&token)?)),
            "-F" | "--form" => {
                let field = value(&token)?;
                let (name, content) = field.split_once('=').unwrap_or((field.as_str(), ""));
                collected.form.push((name.to_string(), content.to_string()));
            }
            "-u" | "--user" => {
                let credentials = STANDARD.encode(value(&token)?);
                collected
                    .headers
                    .push(HeaderPair::new("Authorization", format!("Basic {credentials}")));
            }
            "-b" | "--cookie" => collected.headers.push(HeaderPair::new("Cookie", value(&token)?)),
            "-A" | "--user-agent" => collected
                .headers
                .push(HeaderPair::new("User-Agent", value(&token)?)),
            "-e" | "--referer" => collected
                .headers
                .push(HeaderPair::new("Referer", value(&token)?)),
            "--url" => collected.url = Some(value(&token)?),
            "-o" | "--output" | "-w" | "--write-out" | "-m" | "--max-time"
            | "--connect-timeout" | "-x" | "--proxy" => {
                value(&token)?;
            }
            "-I" | "--head" => collected.head = true,
            "-G" | "--get" => collected.get = true,
            flag if IGNORED_FLAGS.contains(&flag) => {}
            flag if flag.starts_with('-') && flag.len() > 1 => {}
            _ => {
                if collected.url.is_none() {
                    collected.url = Some(token.clone());
                }
            }
        }
    }

    collected.finish()
}

impl Collected {
    fn finish(self) -> DomainResult<ParsedRequestFields> {
        let Some(mut url) = self.url.filter(|u| !u.trim().is_empty()) else {
            return Err(DomainError::InvalidCurl("no URL".to_string()));
        };

        let data = (!self.data.is_empty()).then(|| self.data.join("&"));
        let mut body = None;
        let mut method = self.method;

        if self.get {
            if let Some(data) = data {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&data);
            }
            method = method.or(Some(HttpMethod::Get));
        } else if let Some(data) = data {
            body = Some(ParsedBody::Raw(data));
            method = method.or(Some(HttpMethod::Post));
        } else if !self.form.is_empty() {
            body = Some(ParsedBody::Form(self.form));
            method = method.or(Some(HttpMethod::Post));
        }
        if self.head {
            method = Some(HttpMethod::Head);
        }

        Ok(ParsedRequestFields {
            url: Some(url),
            method,
            headers: self.headers,
            body,
        })
    }
}

fn parse_header(text: &str) -> Option<HeaderPair> {
    let (key, value) = text.split_once(':')?;
    let key = key.trim();
    (!key.is_empty()).then(|| HeaderPair::new(key, value.trim()))
}

/// Encodes one `--data-urlencode` argument the way curl does: the part
/// after the first `=` is encoded and a leading name is kept as is.
fn urlencode_data(arg: &str) -> String {
    let encode = |s: &str| form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>();
    match arg.split_once('=') {
        Some((name, content)) if name.is_empty() => encode(content),
        Some((name, content)) => format!("{name}={}", encode(content)),
        None => encode(arg),
    }
}
