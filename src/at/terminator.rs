//! Terminator-line detection.
//!
//! Only the start of a line is inspected; the body of a response is never
//! parsed.

/// Prefixes that end any AT response. Matched case-sensitively.
pub const GENERIC_TERMINATORS: [&str; 5] = ["OK", "ERROR", "+CMS ERROR:", "+CME ERROR:", "NO CARRIER"];

/// How a response line relates to the end of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// An ordinary body line.
    None,
    /// One of [`GENERIC_TERMINATORS`].
    Generic,
    /// The caller's keyword.
    Keyword,
}

/// Classify one line. A keyword match wins over a generic one.
pub fn classify(line: &[u8], keyword: Option<&str>) -> Termination {
    if line.is_empty() {
        return Termination::None;
    }
    if let Some(keyword) = keyword.filter(|k| !k.is_empty()) {
        if line.starts_with(keyword.as_bytes()) {
            return Termination::Keyword;
        }
    }
    if GENERIC_TERMINATORS
        .iter()
        .any(|prefix| line.starts_with(prefix.as_bytes()))
    {
        return Termination::Generic;
    }
    Termination::None
}
