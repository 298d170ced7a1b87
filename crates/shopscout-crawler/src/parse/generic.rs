//! Chain-driven parser for sites without a dedicated implementation.
//!
//! Everything comes from the site table: item selectors and per-field
//! chains. This keeps the heuristic stage available for any site added to
//! `sites.yaml` without touching the engine.

use scraper::Html;

use shopscout_core::SearchEngineConfig;

use crate::parse::{helpers, SiteParser};
use crate::types::RawProduct;

pub struct GenericParser;

impl SiteParser for GenericParser {
    fn parse(&self, html: &str, site: &SearchEngineConfig, max_items: usize) -> Vec<RawProduct> {
        let doc = Html::parse_document(html);
        let items = helpers::select_items(&doc, &site.item_selectors, max_items);
        tracing::debug!(site = %site.name, candidates = items.len(), "generic parser scanning items");

        items
            .into_iter()
            .filter_map(|item| {
                let raw = RawProduct {
                    product_name: helpers::first_chain_value(item, &site.fields.title),
                    price: helpers::first_chain_value(item, &site.fields.price),
                    rating: helpers::first_chain_value(item, &site.fields.rating),
                    reviews: helpers::first_chain_value(item, &site.fields.reviews),
                    url: helpers::first_chain_value(item, &site.fields.url),
                    seller: helpers::first_chain_value(item, &site.fields.seller),
                };
                if raw.is_discardable() {
                    tracing::debug!(site = %site.name, "skipping item with neither name nor url");
                    None
                } else {
                    Some(raw)
                }
            })
            .collect()
    }
}
