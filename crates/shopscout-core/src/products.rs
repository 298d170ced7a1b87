use serde::{Deserialize, Serialize};

/// Sentinel used for fields that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Which cascade stage produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Llm,
    Schema,
    Heuristic,
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMethod::Llm => write!(f, "llm"),
            ExtractionMethod::Schema => write!(f, "schema"),
            ExtractionMethod::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// One marketplace search-result item, normalized across sites.
///
/// Records are immutable once normalization has run; they live only for the
/// duration of the search call that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_name: String,
    /// Canonical price string with currency symbol, e.g. `"$19.99"`, or the
    /// verbatim source text when it could not be parsed.
    pub price: String,
    /// Parsed numeric price; `None` when the price text was unparsable.
    pub price_numeric: Option<f64>,
    /// Rating out of 5 as a decimal string, e.g. `"4.5"`.
    pub rating: Option<String>,
    /// Review count, e.g. `"1234"`, or a verbatim units-sold phrase such as
    /// `"1.000+ vendidos"` when the site reports sales instead of reviews.
    pub reviews: Option<String>,
    /// Fully-qualified absolute product URL, or `"N/A"` — never a bare
    /// relative path.
    pub url: String,
    pub seller: Option<String>,
    /// Name of the site the record came from.
    pub source: String,
    pub extraction_method: ExtractionMethod,
}

impl ProductRecord {
    /// Rating coerced to a float for filtering/sorting. Takes the leading
    /// numeric token so `"4.5 out of 5"` parses as `4.5`; comma decimals
    /// are tolerated.
    #[must_use]
    pub fn rating_value(&self) -> Option<f64> {
        let raw = self.rating.as_deref()?;
        leading_number(raw)
    }

    /// Review count coerced to an integer; digits embedded in a units-sold
    /// phrase still count, so `"1.000+ vendidos"` yields `1000`.
    #[must_use]
    pub fn review_count(&self) -> Option<u64> {
        let raw = self.reviews.as_deref()?;
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    }
}

/// Parse the leading numeric token of `s`, accepting `.` or `,` as the
/// decimal separator.
fn leading_number(s: &str) -> Option<f64> {
    let trimmed = s.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != ',')
        .unwrap_or(trimmed.len());
    let token = &trimmed[..end];
    if token.is_empty() {
        return None;
    }
    token.replace(',', ".").parse().ok()
}

/// Sort order for ranked search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Original site-config concatenation order.
    #[default]
    Relevance,
    PriceLow,
    PriceHigh,
    Rating,
    Reviews,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortKey::Relevance),
            // Accept both the internal names and the tool-schema aliases.
            "price_low" | "price_asc" => Ok(SortKey::PriceLow),
            "price_high" | "price_desc" => Ok(SortKey::PriceHigh),
            "rating" => Ok(SortKey::Rating),
            "reviews" | "popularity" => Ok(SortKey::Reviews),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Optional search constraints and ranking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub sort_by: SortKey,
}
