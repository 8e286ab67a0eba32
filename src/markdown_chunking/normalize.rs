use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// Map CRLF and lone CR to LF so separator patterns match uniformly.
///
/// Idempotent. Borrows the input when it contains no carriage returns.
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    let re = NEWLINE_REGEX.get_or_init(|| Regex::new("\r\n?").expect("valid newline regex"));
    re.replace_all(text, "\n")
}

static NEWLINE_REGEX: OnceLock<Regex> = OnceLock::new();
