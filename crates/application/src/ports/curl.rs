//! Curl codec port

use courier_domain::{HttpRequest, ParsedRequestFields};

/// Converts between curl command lines and requests.
///
/// Both directions are pure functions of their input.
pub trait CurlCodec: Send + Sync {
    /// Parses a curl command. Returns `None` if the text is not one.
    fn parse(&self, text: &str) -> Option<ParsedRequestFields>;

    /// Renders a request as a curl command.
    fn serialize(&self, request: &HttpRequest) -> String;
}
