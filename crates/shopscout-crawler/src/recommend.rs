//! Top-level search orchestration: URL generation, concurrent site fan-out
//! with per-task isolation, aggregation, and filter/rank.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::task::JoinHandle;

use shopscout_core::{ProductRecord, SearchEngineConfig, SearchFilters, SortKey};

use crate::crawl::SiteCrawler;
use crate::error::CrawlerError;

/// `quote_plus` semantics: keep unreserved characters, encode the rest,
/// render spaces as `+`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b' ')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub struct Recommender {
    sites: Vec<SearchEngineConfig>,
    crawler: SiteCrawler,
}

impl Recommender {
    #[must_use]
    pub fn new(sites: Vec<SearchEngineConfig>, crawler: SiteCrawler) -> Self {
        Self { sites, crawler }
    }

    #[must_use]
    pub fn sites(&self) -> &[SearchEngineConfig] {
        &self.sites
    }

    /// One absolute, percent-encoded search URL per configured site, in
    /// site-config order.
    #[must_use]
    pub fn generate_search_urls(&self, query: &str) -> Vec<String> {
        let encoded = quote_plus(query);
        self.sites
            .iter()
            .map(|site| format!("{}{}", site.search_url, encoded))
            .collect()
    }

    /// Runs the full search: fan out one crawl task per site, await them
    /// all, concatenate in site order, then filter and rank.
    ///
    /// `Ok(vec![])` is the explicit "no results" value — distinct from an
    /// error, which only ever reports invalid caller input.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::CallerInput`] for an empty query, inverted
    /// or negative price bounds, or a rating outside 0–5. Site-side
    /// failures never surface here; they reduce the result count instead.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ProductRecord>, CrawlerError> {
        validate_input(query, filters)?;

        let urls = self.generate_search_urls(query);
        tracing::info!(query, sites = self.sites.len(), "starting product search");

        let handles: Vec<(String, JoinHandle<Vec<ProductRecord>>)> = self
            .sites
            .iter()
            .zip(urls)
            .map(|(site, url)| {
                let crawler = self.crawler.clone();
                let site = site.clone();
                let name = site.name.clone();
                let handle = tokio::spawn(async move { crawler.crawl(&url, &site).await });
                (name, handle)
            })
            .collect();

        let all = collect_site_results(handles).await;
        tracing::info!(query, total = all.len(), "aggregated records across sites");

        Ok(filter_and_rank(all, filters))
    }
}

/// Joins every site task, in site-config order. A task that panicked or was
/// cancelled contributes zero records; its siblings are unaffected.
pub(crate) async fn collect_site_results(
    handles: Vec<(String, JoinHandle<Vec<ProductRecord>>)>,
) -> Vec<ProductRecord> {
    let mut all = Vec::new();
    for (site_name, handle) in handles {
        match handle.await {
            Ok(records) => all.extend(records),
            Err(e) => {
                tracing::error!(
                    site = %site_name,
                    error = %e,
                    "site task failed past its own boundary; contributing zero records"
                );
            }
        }
    }
    all
}

fn validate_input(query: &str, filters: &SearchFilters) -> Result<(), CrawlerError> {
    if query.trim().is_empty() {
        return Err(CrawlerError::CallerInput(
            "query must be non-empty".to_owned(),
        ));
    }
    if let Some(min) = filters.min_price {
        if min < 0.0 {
            return Err(CrawlerError::CallerInput(
                "min_price must be non-negative".to_owned(),
            ));
        }
    }
    if let Some(max) = filters.max_price {
        if max < 0.0 {
            return Err(CrawlerError::CallerInput(
                "max_price must be non-negative".to_owned(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
        if min > max {
            return Err(CrawlerError::CallerInput(format!(
                "min_price {min} exceeds max_price {max}"
            )));
        }
    }
    if let Some(rating) = filters.min_rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(CrawlerError::CallerInput(format!(
                "min_rating {rating} must be between 0 and 5"
            )));
        }
    }
    Ok(())
}

/// Applies the optional filters, then orders by the sort key.
///
/// Price filters and price sorts require `price_numeric`; records without
/// it are excluded there. Rating and review sorts coerce missing values to
/// zero so such records rank last.
#[must_use]
pub fn filter_and_rank(
    mut products: Vec<ProductRecord>,
    filters: &SearchFilters,
) -> Vec<ProductRecord> {
    if let Some(min) = filters.min_price {
        products.retain(|p| p.price_numeric.is_some_and(|v| v >= min));
    }
    if let Some(max) = filters.max_price {
        products.retain(|p| p.price_numeric.is_some_and(|v| v <= max));
    }
    if let Some(min_rating) = filters.min_rating {
        products.retain(|p| p.rating_value().is_some_and(|v| v >= min_rating));
    }

    match filters.sort_by {
        SortKey::Relevance => {}
        SortKey::PriceLow => {
            products.retain(|p| p.price_numeric.is_some());
            products.sort_by(|a, b| price_of(a).total_cmp(&price_of(b)));
        }
        SortKey::PriceHigh => {
            products.retain(|p| p.price_numeric.is_some());
            products.sort_by(|a, b| price_of(b).total_cmp(&price_of(a)));
        }
        SortKey::Rating => {
            products.sort_by(|a, b| rating_of(b).total_cmp(&rating_of(a)));
        }
        SortKey::Reviews => {
            products.sort_by_key(|p| std::cmp::Reverse(p.review_count().unwrap_or(0)));
        }
    }
    products
}

fn price_of(p: &ProductRecord) -> f64 {
    p.price_numeric.unwrap_or(f64::INFINITY)
}

fn rating_of(p: &ProductRecord) -> f64 {
    p.rating_value().unwrap_or(0.0)
}

/// Percent-encode a query for a search URL, with spaces as `+`.
fn quote_plus(query: &str) -> String {
    utf8_percent_encode(query, QUERY_ENCODE_SET)
        .to_string()
        .replace(' ', "+")
}

#[cfg(test)]
#[path = "recommend_test.rs"]
mod tests;
