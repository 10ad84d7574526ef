//! Note formatting: heading, hierarchical tag line, transcript body.

use std::sync::LazyLock;

use regex::Regex;

/// Punctuation Flomo tags cannot carry.
const TAG_STRIP_CHARS: &[char] = &[
    '\'', '"', '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '+', '=', '[', ']', '{', '}',
    ';', ':', ',', '.', '<', '>', '/', '?', '\\', '|',
];

/// Make `title` usable as one tag segment.
///
/// Whitespace runs become `-` and ASCII punctuation is dropped; letters in
/// any script are kept.
pub fn sanitize_tag_segment(title: &str) -> String {
    static WHITESPACE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WHITESPACE_RE
        .replace_all(title, "-")
        .chars()
        .filter(|c| !TAG_STRIP_CHARS.contains(c))
        .collect()
}

/// A note ready for the sink, before rendering to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPayload {
    /// H1 heading; absent for an empty title.
    pub heading: Option<String>,
    /// `[prefix, platform, sanitized title]`, joined with `/`.
    pub tag_path: Vec<String>,
    /// The transcript Markdown.
    pub body: String,
}

impl DeliveryPayload {
    pub fn build(title: &str, content: &str, platform: &str, tag_prefix: &str) -> Self {
        let heading = (!title.is_empty()).then(|| title.to_string());

        let mut tag_path = vec![tag_prefix.to_string(), platform.to_string()];
        if heading.is_some() {
            let segment = sanitize_tag_segment(title);
            if !segment.is_empty() {
                tag_path.push(segment);
            }
        }

        Self {
            heading,
            tag_path,
            body: content.to_string(),
        }
    }

    /// The note text posted to the sink.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 128);
        if let Some(heading) = &self.heading {
            out.push_str("# ");
            out.push_str(heading);
            out.push_str("\n\n");
        }
        out.push_str(&self.tag_path.join("/"));
        out.push_str("\n\n");
        out.push_str(&self.body);
        out
    }
}

/// Compose the note text for one conversation.
pub fn format_flomo_content(title: &str, content: &str, platform: &str, tag_prefix: &str) -> String {
    DeliveryPayload::build(title, content, platform, tag_prefix).render()
}
