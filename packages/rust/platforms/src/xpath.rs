//! Evaluation of absolute XPath location paths against a parsed snapshot.
//!
//! Only the shape captured from real page snapshots is supported: a chain of
//! child steps by element name, each with an optional 1-based positional
//! predicate, e.g. `/html/body/div[2]/div/main/article[1]`. A step without a
//! predicate selects every same-named child, as XPath does.

use scraper::{ElementRef, Html};
use tracing::debug;

#[derive(Debug, PartialEq)]
struct Step<'p> {
    name: &'p str,
    position: Option<usize>,
}

fn parse(path: &str) -> Option<Vec<Step<'_>>> {
    let rest = path.strip_prefix('/')?;
    rest.split('/')
        .map(|raw| {
            let (name, position) = match raw.split_once('[') {
                Some((name, pred)) => {
                    let n: usize = pred.strip_suffix(']')?.trim().parse().ok()?;
                    (name, Some(n))
                }
                None => (raw, None),
            };
            if name.is_empty() || position == Some(0) {
                return None;
            }
            Some(Step { name, position })
        })
        .collect()
}

/// All elements selected by `path`, in document order.
///
/// A malformed path selects nothing.
pub(crate) fn select_all<'a>(doc: &'a Html, path: &str) -> Vec<ElementRef<'a>> {
    let Some(steps) = parse(path) else {
        debug!(path, "unsupported xpath");
        return Vec::new();
    };
    let Some((first, rest)) = steps.split_first() else {
        return Vec::new();
    };

    let root = doc.root_element();
    if root.value().name() != first.name || first.position.is_some_and(|p| p != 1) {
        return Vec::new();
    }

    let mut current = vec![root];
    for step in rest {
        let mut next = Vec::new();
        for node in &current {
            let mut position = 0;
            for child in node.children().filter_map(ElementRef::wrap) {
                if child.value().name() != step.name {
                    continue;
                }
                position += 1;
                if step.position.is_none_or(|p| p == position) {
                    next.push(child);
                }
            }
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current
}

/// First element selected by `path` (`FIRST_ORDERED_NODE_TYPE`).
pub(crate) fn select_first<'a>(doc: &'a Html, path: &str) -> Option<ElementRef<'a>> {
    select_all(doc, path).into_iter().next()
}
