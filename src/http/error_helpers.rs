//! Error text formatting for HTTP failures and unparseable bodies.

use std::error::Error;

/// Maximum characters to include from a response body in error messages
const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

/// Describes an error together with its chain of sources.
///
/// `reqwest` errors carry the interesting part ("connection refused", "operation
/// timed out") in their sources, so the top-level message alone is not enough.
pub(crate) fn describe_error_chain(error: &dyn Error) -> String {
    let mut description = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}

/// Formats a JSON parse failure with a preview of the offending body.
pub(crate) fn format_json_parse_error(body: &str, error: &serde_json::Error) -> String {
    let preview = truncate_for_context(body, ERROR_BODY_PREVIEW_LENGTH);
    format!("JSON parse error: {error} | Context: {preview}")
}

/// Returns a preview of a body for inclusion in error messages.
pub(crate) fn body_preview(body: &str) -> String {
    truncate_for_context(body, ERROR_BODY_PREVIEW_LENGTH)
}

/// Truncates a string to at most `max_len` bytes, adding "..." if truncated.
///
/// Never splits a multi-byte UTF-8 character.
pub(crate) fn truncate_for_context(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
