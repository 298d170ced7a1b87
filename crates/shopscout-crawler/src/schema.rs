//! Declarative selector-schema extraction.
//!
//! Purely mechanical: the site table's canonical field mapping (the first
//! selector of each configured chain) applied to the page. Unlike the
//! heuristic stage, a schema whose base selector does not parse is an
//! error — a broken table should be visible in the cascade log, not
//! silently produce nothing.

use scraper::{Html, Selector};

use shopscout_core::SearchEngineConfig;

use crate::error::CrawlerError;
use crate::parse::helpers;
use crate::types::RawProduct;

/// Applies the site's selector schema to `html`.
///
/// # Errors
///
/// Returns [`CrawlerError::InvalidSelector`] when no configured item
/// selector parses. Field selectors that fail to parse are skipped.
pub fn extract_with_schema(
    html: &str,
    site: &SearchEngineConfig,
    max_items: usize,
) -> Result<Vec<RawProduct>, CrawlerError> {
    let base = site
        .item_selectors
        .iter()
        .find_map(|spec| Selector::parse(spec).ok().map(|sel| (spec, sel)));
    let Some((base_spec, base_selector)) = base else {
        return Err(CrawlerError::InvalidSelector {
            selector: site.item_selectors.join(", "),
        });
    };
    tracing::debug!(site = %site.name, selector = %base_spec, "schema extraction using base selector");

    let doc = Html::parse_document(html);

    let records = doc
        .select(&base_selector)
        .take(max_items)
        .filter_map(|item| {
            let raw = RawProduct {
                product_name: field(item, &site.fields.title),
                price: field(item, &site.fields.price),
                rating: field(item, &site.fields.rating),
                reviews: field(item, &site.fields.reviews),
                url: field(item, &site.fields.url),
                seller: field(item, &site.fields.seller),
            };
            if raw.is_discardable() {
                None
            } else {
                Some(raw)
            }
        })
        .collect();

    Ok(records)
}

/// Canonical mapping: only the first selector of a chain participates in
/// schema extraction; later entries are heuristic-stage fallbacks.
fn field(item: scraper::ElementRef<'_>, chain: &[String]) -> Option<String> {
    let spec = chain.first()?;
    helpers::first_chain_value(item, std::slice::from_ref(spec))
}
