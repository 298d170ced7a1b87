//! Normalization from raw extracted fields to [`ProductRecord`].
//!
//! Price text arrives in every shape the sites can produce: prose prefixes
//! ("List Price:"), split text nodes, and both `1,234.56` and `1.234,56`
//! separator conventions. Unparsable price text is kept verbatim rather
//! than discarded, with `price_numeric` left unset.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use shopscout_core::{ExtractionMethod, ProductRecord, SearchEngineConfig, NOT_AVAILABLE};

use crate::types::{clean_field, RawProduct};

const SOLD_MARKERS: &[&str] = &["sold", "vendidos", "ventes"];

fn number_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d.,]*").expect("hard-coded regex is valid"))
}

/// Normalizes price text to the canonical `{symbol}{amount:.2}` form.
///
/// Returns the canonical string and the parsed amount; when no numeric
/// token can be found the input is returned verbatim with `None`.
/// A missing currency symbol defaults to `$`.
#[must_use]
pub fn normalize_price(raw: &str) -> (String, Option<f64>) {
    let trimmed = raw.trim();
    // Re-join separators split across text nodes ("12 .99" → "12.99").
    let compact = trimmed
        .replace(" .", ".")
        .replace(". ", ".")
        .replace(" ,", ",")
        .replace(", ", ",");

    let symbol = detect_symbol(&compact).unwrap_or("$");
    let Some(token) = number_token_regex().find(&compact) else {
        return (trimmed.to_owned(), None);
    };
    let Some(amount) = parse_amount(token.as_str()) else {
        return (trimmed.to_owned(), None);
    };

    (format!("{symbol}{amount:.2}"), Some(amount))
}

fn detect_symbol(s: &str) -> Option<&'static str> {
    if s.contains("US $") || s.contains("US$") {
        return Some("$");
    }
    [('$', "$"), ('€', "€"), ('£', "£"), ('¥', "¥"), ('₹', "₹")]
        .into_iter()
        .find_map(|(ch, sym)| s.contains(ch).then_some(sym))
}

/// Parses a numeric token, detecting the separator convention by the
/// presence and position of `.` and `,`.
fn parse_amount(token: &str) -> Option<f64> {
    let token = token.trim_matches(|c| c == '.' || c == ',');
    if token.is_empty() {
        return None;
    }

    let cleaned = match (token.rfind('.'), token.rfind(',')) {
        // Both present: the rightmost separator is the decimal point.
        (Some(dot), Some(comma)) if dot > comma => token.replace(',', ""),
        (Some(_), Some(_)) => token.replace('.', "").replace(',', "."),
        (Some(_), None) => disambiguate(token, '.'),
        (None, Some(_)) => disambiguate(token, ','),
        (None, None) => token.to_owned(),
    };
    cleaned.parse().ok()
}

/// A single separator with one or two trailing digits is a decimal point
/// (`9,45` → 9.45); anything else is a thousands separator (`1.234` → 1234).
fn disambiguate(token: &str, sep: char) -> String {
    let occurrences = token.matches(sep).count();
    let tail_len = token.rsplit(sep).next().map_or(0, str::len);
    if occurrences == 1 && (1..=2).contains(&tail_len) {
        token.replace(sep, ".")
    } else {
        token.replace(sep, "")
    }
}

/// Normalizes rating text to a one-decimal string out of 5.
///
/// Takes the first numeric token (`"4.5 out of 5 stars"` → `"4.5"`,
/// `"4,7"` → `"4.7"`); values outside 0–5 are rejected.
#[must_use]
pub fn normalize_rating(raw: &str) -> Option<String> {
    let value = first_number(raw)?;
    if !(0.0..=5.0).contains(&value) {
        return None;
    }
    Some(format!("{value:.1}"))
}

/// Rating from a partial-width star strip:
/// `(Σ capped width / (count × full width)) × 5`, one decimal.
#[must_use]
pub fn rating_from_star_widths(widths: &[f64], full_width: f64) -> Option<String> {
    if widths.is_empty() || full_width <= 0.0 {
        return None;
    }
    let filled: f64 = widths.iter().map(|w| w.clamp(0.0, full_width)).sum();
    #[allow(clippy::cast_precision_loss)]
    let denominator = widths.len() as f64 * full_width;
    let rating = (filled / denominator) * 5.0;
    Some(format!("{rating:.1}"))
}

/// Normalizes a review/sales count.
///
/// Units-sold phrases are preserved verbatim — they are sales figures, not
/// review counts, and must not be mislabeled by stripping the qualifier.
/// Everything else is reduced to its digits (`"1,234"` → `"1234"`).
#[must_use]
pub fn normalize_reviews(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if SOLD_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Some(trimmed.to_owned());
    }
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Resolves an href against the site base URL into an absolute URL.
///
/// Protocol-relative hrefs (`//host/path`) take the base URL's scheme;
/// relative paths are joined with exactly one separating slash.
#[must_use]
pub fn resolve_url(base_url: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_owned();
    }
    if let Some(rest) = href.strip_prefix("//") {
        let scheme = Url::parse(base_url)
            .map(|u| u.scheme().to_owned())
            .unwrap_or_else(|_| "https".to_owned());
        return format!("{scheme}://{rest}");
    }
    if let Ok(base) = Url::parse(base_url) {
        if let Ok(joined) = base.join(href) {
            return joined.to_string();
        }
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        href.trim_start_matches('/')
    )
}

/// Assembles a normalized, source-tagged [`ProductRecord`] from raw fields.
///
/// Returns `None` only when the record is discardable (neither name nor
/// URL); a record with a name but no price is still kept.
#[must_use]
pub fn normalize_record(
    raw: RawProduct,
    site: &SearchEngineConfig,
    method: ExtractionMethod,
) -> Option<ProductRecord> {
    if raw.is_discardable() {
        return None;
    }

    let (price, price_numeric) = clean_field(raw.price)
        .map_or_else(|| (NOT_AVAILABLE.to_owned(), None), |p| normalize_price(&p));

    let url = clean_field(raw.url).map_or_else(
        || NOT_AVAILABLE.to_owned(),
        |href| resolve_url(&site.base_url, &href),
    );

    Some(ProductRecord {
        product_name: clean_field(raw.product_name).unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
        price,
        price_numeric,
        rating: clean_field(raw.rating).and_then(|r| normalize_rating(&r)),
        reviews: clean_field(raw.reviews).and_then(|r| normalize_reviews(&r)),
        url,
        seller: clean_field(raw.seller),
        source: site.name.clone(),
        extraction_method: method,
    })
}

/// First numeric token anywhere in `s`, with `,` accepted as the decimal
/// separator.
fn first_number(s: &str) -> Option<f64> {
    let token = number_token_regex().find(s)?;
    let cleaned = token.as_str().trim_matches(|c| c == '.' || c == ',');
    cleaned.replace(',', ".").parse().ok()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
