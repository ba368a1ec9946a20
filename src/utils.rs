//! Small helpers used across the pipeline.
//!
//! - Character-boundary truncation for article text and log fields
//! - HTML escaping for post bodies
//! - HTTP status checking that keeps a preview of the error body

use crate::error::PipelineError;
use reqwest::Response;
use tracing::warn;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of characters to keep
///
/// # Returns
///
/// The original string if it has at most `max` characters, otherwise a
/// truncated version with `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Keep the first `max` characters of `s`.
///
/// Cuts at a character boundary, never inside a multi-byte sequence and
/// without regard for word boundaries.
///
/// # Arguments
///
/// * `s` - The text to shorten
/// * `max` - Maximum number of characters to keep
///
/// # Returns
///
/// `s` unchanged if it is short enough, otherwise its first `max` characters
/// with no marker appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("championship", 5), "champ");
/// assert_eq!(truncate_chars("éé", 10), "éé");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => s[..cut].to_string(),
    }
}

/// Escape text for inclusion in HTML element content or a quoted attribute.
///
/// # Returns
///
/// `s` with `&`, `<`, `>`, `"` and `'` replaced by their entities.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(escape_html("<b>Q&A</b>"), "&lt;b&gt;Q&amp;A&lt;/b&gt;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Turn a non-success response into [`PipelineError::Status`].
///
/// The error body is read and kept (truncated) so the log line explains what
/// the remote service objected to.
///
/// # Arguments
///
/// * `service` - Name used in the log line and the error
/// * `response` - The response to check
///
/// # Returns
///
/// The response untouched when its status is 2xx.
pub async fn ensure_success(
    service: &'static str,
    response: Response,
) -> Result<Response, PipelineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = truncate_for_log(&body, 300);
    warn!(service, %status, %body, "Remote service returned an error status");
    Err(PipelineError::Status {
        service,
        status,
        body,
    })
}
