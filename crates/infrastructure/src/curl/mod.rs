//! curl command codec.

mod parser;
mod render;
mod tokenizer;

use courier_application::ports::CurlCodec;
use courier_domain::{HttpRequest, ParsedRequestFields};
use tracing::debug;

pub use parser::parse_curl;
pub use render::render_curl;
pub use tokenizer::tokenize;

/// The [`CurlCodec`] adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlCommandCodec;

impl CurlCommandCodec {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CurlCodec for CurlCommandCodec {
    fn parse(&self, text: &str) -> Option<ParsedRequestFields> {
        parse_curl(text)
            .inspect_err(|err| debug!(error = %err, "rejected curl command"))
            .ok()
    }

    fn serialize(&self, request: &HttpRequest) -> String {
        render_curl(request)
    }
}
