//! Text-level cleanup passes applied after tags are gone.
//!
//! Each pass is a function `&str -> String` applied in sequence by
//! [`crate::normalize`].

use std::sync::LazyLock;

use regex::{Captures, Regex};

// ---------------------------------------------------------------------------
// Entity decoding
// ---------------------------------------------------------------------------

/// Decode the HTML entities a serialized DOM fragment actually contains.
///
/// Named entities cover what an HTML serializer emits for text nodes;
/// numeric references are decoded generically, except the code-block
/// sentinel, which stays encoded. `&amp;` goes last so that
/// `&amp;lt;` decodes to the literal text `&lt;`.
pub(crate) fn decode_entities(text: &str) -> String {
    static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").expect("valid regex")
    });

    if !text.contains('&') {
        return text.to_string();
    }

    let decoded = NUMERIC_RE.replace_all(text, |caps: &Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .filter(|&c| c != crate::CODE_SENTINEL)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

/// Trim every line.
///
/// Indentation left over from the page source would otherwise turn paragraphs
/// into Markdown indented code blocks. Shielded code blocks are not affected.
pub(crate) fn normalize_whitespace(md: &str) -> String {
    md.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}

/// Collapse runs of 3+ newlines (2+ blank lines) into a single blank line.
pub(crate) fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}
