//! Amazon search-result parsing.
//!
//! Amazon renders prices in three coexisting shapes (`a-offscreen` text,
//! whole/fraction split, plain `a-price` text), so price assembly tries the
//! split form before falling back to the flat chains.

use scraper::{ElementRef, Html, Selector};

use shopscout_core::SearchEngineConfig;

use crate::parse::{helpers, SiteParser};
use crate::types::RawProduct;

const ITEM_SELECTORS: &[&str] = &[
    "div.s-result-item[data-component-type='s-search-result']",
    "div.s-result-item[data-asin]:not([data-asin=''])",
];

const TITLE_CHAIN: &[&str] = &[
    "h2 a.a-link-normal span.a-text-normal",
    "h2.a-size-base-plus span",
    "h2 span",
];

const URL_CHAIN: &[&str] = &[
    "h2 a.a-link-normal@href",
    "a.a-link-normal.s-no-outline@href",
    "a.a-link-normal@href",
];

const RATING_CHAIN: &[&str] = &["i.a-icon-star-small span.a-icon-alt", "span.a-icon-alt"];

const REVIEW_SELECTORS: &[&str] = &["span.a-size-base.s-underline-text", "span.a-size-base"];

pub struct AmazonParser;

impl SiteParser for AmazonParser {
    fn parse(&self, html: &str, site: &SearchEngineConfig, max_items: usize) -> Vec<RawProduct> {
        let doc = Html::parse_document(html);
        let items = helpers::select_items(&doc, ITEM_SELECTORS, max_items);
        tracing::debug!(site = %site.name, candidates = items.len(), "amazon parser scanning items");

        items
            .into_iter()
            .filter_map(|item| {
                let raw = parse_item(item);
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

fn parse_item(item: ElementRef<'_>) -> RawProduct {
    RawProduct {
        product_name: helpers::first_chain_value(item, TITLE_CHAIN),
        price: item_price(item),
        rating: helpers::first_chain_value(item, RATING_CHAIN),
        reviews: review_count(item),
        url: helpers::first_chain_value(item, URL_CHAIN),
        // Seller is not reliably present on the search page.
        seller: None,
    }
}

/// Price from the `a-price` block: whole/fraction assembly first, then the
/// screen-reader `a-offscreen` text.
fn item_price(item: ElementRef<'_>) -> Option<String> {
    if let Ok(price_sel) = Selector::parse("span.a-price") {
        if let Some(price_el) = item.select(&price_sel).next() {
            let part = |css: &str| -> Option<String> {
                let sel = Selector::parse(css).ok()?;
                price_el
                    .select(&sel)
                    .next()
                    .map(helpers::element_text)
                    .filter(|t| !t.is_empty())
            };

            if let (Some(whole), Some(fraction)) =
                (part("span.a-price-whole"), part("span.a-price-fraction"))
            {
                let whole = whole.trim_end_matches('.');
                let symbol = part("span.a-price-symbol").unwrap_or_default();
                return Some(format!("{symbol}{whole}.{fraction}"));
            }

            if let Some(offscreen) = part("span.a-offscreen") {
                return Some(offscreen);
            }
        }
    }

    helpers::first_chain_value(item, &["span.a-offscreen"])
}

/// Review count: `a-size-base` is reused all over the card, so a candidate
/// only counts when its text is purely numeric (commas allowed).
fn review_count(item: ElementRef<'_>) -> Option<String> {
    for css in REVIEW_SELECTORS {
        let Ok(sel) = Selector::parse(css) else {
            continue;
        };
        for el in item.select(&sel) {
            let text = helpers::element_text(el);
            let digits_only = text.replace(',', "");
            if !digits_only.is_empty() && digits_only.chars().all(|c| c.is_ascii_digit()) {
                return Some(text);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use shopscout_core::SitesFile;

    use super::*;

    fn amazon_site() -> SearchEngineConfig {
        SitesFile::default_sites().sites.remove(0)
    }

    fn result_item(inner: &str) -> String {
        format!(
            "<html><body>\
             <div class='s-result-item' data-component-type='s-search-result' data-asin='B0TEST'>{inner}</div>\
             </body></html>"
        )
    }

    const FULL_ITEM: &str = r#"
        <h2 class='a-size-base-plus'><a class='a-link-normal' href='/dp/B0TEST'>
            <span class='a-text-normal'>Wireless  Earbuds,
                Bluetooth 5.3</span></a></h2>
        <span class='a-price'>
            <span class='a-offscreen'>$19.99</span>
            <span class='a-price-symbol'>$</span>
            <span class='a-price-whole'>19.</span>
            <span class='a-price-fraction'>99</span>
        </span>
        <i class='a-icon-star-small'><span class='a-icon-alt'>4.5 out of 5 stars</span></i>
        <span class='a-size-base s-underline-text'>12,047</span>
    "#;

    #[test]
    fn parses_full_result_item() {
        let html = result_item(FULL_ITEM);
        let records = AmazonParser.parse(&html, &amazon_site(), 10);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(
            r.product_name.as_deref(),
            Some("Wireless Earbuds, Bluetooth 5.3")
        );
        assert_eq!(r.price.as_deref(), Some("$19.99"));
        assert_eq!(r.rating.as_deref(), Some("4.5 out of 5 stars"));
        assert_eq!(r.reviews.as_deref(), Some("12,047"));
        assert_eq!(r.url.as_deref(), Some("/dp/B0TEST"));
        assert!(r.seller.is_none());
    }

    #[test]
    fn price_assembled_from_whole_and_fraction_when_no_offscreen() {
        let html = result_item(
            r"<h2><a class='a-link-normal' href='/dp/B1'><span class='a-text-normal'>Lamp</span></a></h2>
              <span class='a-price'>
                <span class='a-price-symbol'>$</span>
                <span class='a-price-whole'>7.</span>
                <span class='a-price-fraction'>49</span>
              </span>",
        );
        let records = AmazonParser.parse(&html, &amazon_site(), 10);
        assert_eq!(records[0].price.as_deref(), Some("$7.49"));
    }

    #[test]
    fn missing_fields_are_none_not_errors() {
        let html = result_item(
            "<h2><a class='a-link-normal' href='/dp/B2'><span class='a-text-normal'>Bare Item</span></a></h2>",
        );
        let records = AmazonParser.parse(&html, &amazon_site(), 10);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert!(r.price.is_none());
        assert!(r.rating.is_none());
        assert!(r.reviews.is_none());
    }

    #[test]
    fn non_numeric_a_size_base_is_not_a_review_count() {
        let html = result_item(
            "<h2><a class='a-link-normal' href='/dp/B3'><span class='a-text-normal'>Thing</span></a></h2>
             <span class='a-size-base'>Ships to Germany</span>",
        );
        let records = AmazonParser.parse(&html, &amazon_site(), 10);
        assert!(records[0].reviews.is_none());
    }

    #[test]
    fn item_without_name_or_url_is_skipped_but_siblings_survive() {
        let html = "<html><body>\
            <div class='s-result-item' data-component-type='s-search-result'>\
              <span class='a-price'><span class='a-offscreen'>$5.00</span></span>\
            </div>\
            <div class='s-result-item' data-component-type='s-search-result'>\
              <h2><a class='a-link-normal' href='/dp/B4'><span class='a-text-normal'>Kept</span></a></h2>\
            </div>\
            </body></html>";
        let records = AmazonParser.parse(html, &amazon_site(), 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_name.as_deref(), Some("Kept"));
    }

    #[test]
    fn respects_max_items() {
        let items: String = (0..8)
            .map(|i| {
                format!(
                    "<div class='s-result-item' data-component-type='s-search-result'>\
                     <h2><a class='a-link-normal' href='/dp/B{i}'><span class='a-text-normal'>Item {i}</span></a></h2>\
                     </div>"
                )
            })
            .collect();
        let html = format!("<html><body>{items}</body></html>");
        let records = AmazonParser.parse(&html, &amazon_site(), 3);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn parsing_is_idempotent() {
        let html = result_item(FULL_ITEM);
        let first = AmazonParser.parse(&html, &amazon_site(), 10);
        let second = AmazonParser.parse(&html, &amazon_site(), 10);
        assert_eq!(first, second);
    }
}
