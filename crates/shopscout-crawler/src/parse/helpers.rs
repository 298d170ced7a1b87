//! Selector-chain helpers shared by the heuristic parsers and the schema
//! extractor.

use scraper::{ElementRef, Html, Selector};

/// Splits a `"selector@attr"` spec into its CSS part and optional attribute.
/// A bare `"@attr"` (empty CSS part) targets the item root itself.
pub(crate) fn split_attr(spec: &str) -> (&str, Option<&str>) {
    match spec.rsplit_once('@') {
        Some((css, attr)) if !attr.is_empty() && !attr.contains(']') => (css, Some(attr)),
        _ => (spec, None),
    }
}

/// Collapse runs of whitespace (including newlines from the DOM) to single
/// spaces.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// First non-empty value produced by an ordered selector chain, scoped to
/// one item's subtree. Text values are whitespace-collapsed; attribute
/// values are trimmed. A selector that fails to parse is skipped, not fatal.
pub(crate) fn first_chain_value<S: AsRef<str>>(
    item: ElementRef<'_>,
    chain: &[S],
) -> Option<String> {
    for spec in chain {
        let (css, attr) = split_attr(spec.as_ref());

        if css.is_empty() {
            if let Some(name) = attr {
                if let Some(value) = item.value().attr(name) {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_owned());
                    }
                }
            }
            continue;
        }

        let Ok(selector) = Selector::parse(css) else {
            tracing::debug!(selector = css, "skipping unparsable selector in chain");
            continue;
        };

        for el in item.select(&selector) {
            let value = match attr {
                Some(name) => el.value().attr(name).map(|v| v.trim().to_owned()),
                None => Some(element_text(el)),
            };
            if let Some(v) = value {
                if !v.is_empty() {
                    return Some(v);
                }
            }
        }
    }
    None
}

/// Result items for a page: the first item selector that matches anything
/// wins, capped at `max_items`.
pub(crate) fn select_items<'a, S: AsRef<str>>(
    doc: &'a Html,
    selectors: &[S],
    max_items: usize,
) -> Vec<ElementRef<'a>> {
    for spec in selectors {
        let Ok(selector) = Selector::parse(spec.as_ref()) else {
            tracing::debug!(selector = spec.as_ref(), "skipping unparsable item selector");
            continue;
        };
        let items: Vec<ElementRef<'a>> = doc.select(&selector).take(max_items).collect();
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}
