//! Tag framing for assistant output.
//!
//! The assistant separates internal reasoning from user-visible output with
//! two tags: `<thinking>…</thinking>` (optional) and `<response>…</response>`
//! (mandatory for a terminal turn). Parsing here is total: malformed or
//! missing tags degrade to "not found", never to a panic.

const RESPONSE_OPEN: &str = "<response>";
const RESPONSE_CLOSE: &str = "</response>";
const THINKING_OPEN: &str = "<thinking>";
const THINKING_CLOSE: &str = "</thinking>";

/// A reply classified at the tag boundary, before any further logic
/// touches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framed {
    /// A terminal user-visible response (tag contents, trimmed).
    Response(String),
    /// Reasoning only, no response tag (thinking contents, trimmed).
    Thinking(String),
    /// Neither tag found; raw text carried as-is.
    Unparsed(String),
}

/// Extract the user-visible response from tagged text.
///
/// Returns the trimmed contents of the first well-formed
/// `<response>…</response>` pair, or `None` if the tags are absent or
/// malformed.
pub fn extract_response(text: &str) -> Option<String> {
    extract_between(text, RESPONSE_OPEN, RESPONSE_CLOSE)
}

/// Extract internal reasoning from tagged text.
pub fn extract_thinking(text: &str) -> Option<String> {
    extract_between(text, THINKING_OPEN, THINKING_CLOSE)
}

/// Classify a raw assistant reply into a tagged variant.
pub fn classify(text: &str) -> Framed {
    if let Some(response) = extract_response(text) {
        return Framed::Response(response);
    }
    if let Some(thinking) = extract_thinking(text) {
        return Framed::Thinking(thinking);
    }
    Framed::Unparsed(text.to_string())
}

fn extract_between(text: &str, open: &str, close: &str) -> Option<String> {
    let start = text.find(open)? + open.len();
    let end = text[start..].find(close)? + start;
    Some(text[start..end].trim().to_string())
}
