//! Conversation title resolution.

use scraper::Html;

use crate::{dom, xpath};

/// One place a conversation title may be found.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TitleSource {
    /// Text of the first node at an absolute XPath.
    XPath(&'static str),
    /// The document `<title>`, unless it contains the brand name.
    DocumentTitle { exclude: &'static str },
    /// Text of the first element matching a CSS selector.
    Selector(&'static str),
}

impl TitleSource {
    fn read(&self, doc: &Html) -> Option<String> {
        let text = match self {
            Self::XPath(path) => xpath::select_first(doc, path).map(dom::text_of)?,
            Self::DocumentTitle { exclude } => {
                let title = dom::select_first(doc.root_element(), "title").map(dom::text_of)?;
                if title.contains(exclude) {
                    return None;
                }
                title
            }
            Self::Selector(css) => dom::select_first(doc.root_element(), css).map(dom::text_of)?,
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Pick the conversation title.
///
/// A non-blank `user_title` wins verbatim. Otherwise the first source with
/// non-empty trimmed text wins, else `"<display_name> Conversation"`.
pub(crate) fn resolve_title(
    doc: &Html,
    user_title: &str,
    sources: &[TitleSource],
    display_name: &str,
) -> String {
    if !user_title.trim().is_empty() {
        return user_title.to_string();
    }
    sources
        .iter()
        .find_map(|source| source.read(doc))
        .unwrap_or_else(|| format!("{display_name} Conversation"))
}
