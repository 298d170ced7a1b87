//! AliExpress search-result parsing.
//!
//! The result card is itself an anchor, so the product URL comes off the
//! item root. Rating and sales count share one span row; the row is
//! disambiguated by content, and a partial-width star strip serves as the
//! rating fallback when no textual rating is rendered.

use scraper::{ElementRef, Html, Selector};

use shopscout_core::SearchEngineConfig;

use crate::normalize::rating_from_star_widths;
use crate::parse::{helpers, SiteParser};
use crate::types::RawProduct;

const ITEM_SELECTORS: &[&str] = &["a.search-card-item", "div.search-item-card-wrapper-gallery a"];

const TITLE_CHAIN: &[&str] = &["h3.kc_j0", "h1", "h3"];

const PRICE_CHAIN: &[&str] = &["div.kc_k1", "div.multi--price-sale--U-S0Mn"];

const SELLER_CHAIN: &[&str] = &["span.io_ip a.io_ir"];

/// Rating/sales span row on the card.
const RATING_ROW: &str = "div.kc_j7 span.kc_jv";

/// Partial-width star elements, e.g. `<span style="width: 8px">`.
const STAR_SPANS: &str = "div[class*='star'] span[style*='width']";

/// Rendered width of one full star in the star strip.
const FULL_STAR_WIDTH_PX: f64 = 10.0;

const SOLD_MARKERS: &[&str] = &["sold", "vendidos", "ventes"];

pub struct AliExpressParser;

impl SiteParser for AliExpressParser {
    fn parse(&self, html: &str, site: &SearchEngineConfig, max_items: usize) -> Vec<RawProduct> {
        let doc = Html::parse_document(html);
        let items = helpers::select_items(&doc, ITEM_SELECTORS, max_items);
        tracing::debug!(site = %site.name, candidates = items.len(), "aliexpress parser scanning items");

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
    let (mut rating, reviews) = rating_and_sales(item);
    if rating.is_none() {
        rating = star_width_rating(item);
    }

    RawProduct {
        product_name: helpers::first_chain_value(item, TITLE_CHAIN),
        price: helpers::first_chain_value(item, PRICE_CHAIN),
        rating,
        reviews,
        url: helpers::first_chain_value(item, &["@href"]),
        seller: helpers::first_chain_value(item, SELLER_CHAIN),
    }
}

/// Splits the shared span row into rating and sales count.
///
/// The first numeric-looking span is the rating; the last span is kept
/// verbatim as the sales count when it carries a sold marker — it is a
/// sales figure, not a review count, and must not be mislabeled by
/// stripping the qualifier.
fn rating_and_sales(item: ElementRef<'_>) -> (Option<String>, Option<String>) {
    let Ok(sel) = Selector::parse(RATING_ROW) else {
        return (None, None);
    };
    let texts: Vec<String> = item
        .select(&sel)
        .map(helpers::element_text)
        .filter(|t| !t.is_empty())
        .collect();
    if texts.is_empty() {
        return (None, None);
    }

    let mut rating = texts.first().filter(|t| looks_numeric(t)).cloned();

    let last = &texts[texts.len() - 1];
    let lowered = last.to_lowercase();
    let mut reviews = None;
    if SOLD_MARKERS.iter().any(|m| lowered.contains(m)) {
        reviews = Some(last.clone());
    } else if rating.is_none() && looks_numeric(last) {
        rating = Some(last.clone());
    }

    (rating, reviews)
}

/// `"4.7"` and `"4,7"` pass; `"1.000+ vendidos"` does not.
fn looks_numeric(s: &str) -> bool {
    let mut separators = 0;
    let mut digits = 0;
    for c in s.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' | ',' => separators += 1,
            _ => return false,
        }
    }
    digits > 0 && separators <= 1
}

/// Rating from the partial-width star strip.
fn star_width_rating(item: ElementRef<'_>) -> Option<String> {
    let sel = Selector::parse(STAR_SPANS).ok()?;
    let widths: Vec<f64> = item
        .select(&sel)
        .filter_map(|el| el.value().attr("style").and_then(style_width_px))
        .collect();
    rating_from_star_widths(&widths, FULL_STAR_WIDTH_PX)
}

/// Extracts the pixel value of a `width` declaration from an inline style.
fn style_width_px(style: &str) -> Option<f64> {
    let idx = style.find("width")?;
    let rest = &style[idx + "width".len()..];
    let value = rest.trim_start().strip_prefix(':')?.trim_start();
    let end = value.find("px")?;
    value[..end].trim().parse().ok()
}
