//! Per-site crawl orchestration: fetch → cascade → normalize → tag.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use shopscout_core::{ProductRecord, SearchEngineConfig};
use shopscout_llm::LlmClient;

use crate::browser::BrowserPool;
use crate::cascade::Cascade;
use crate::normalize::normalize_record;
use crate::observer::PageObserver;

/// Crawls one site's search page. `crawl` never errors: every internal
/// failure is logged with the site name and collapses to an empty
/// contribution, so one broken site cannot take down a search.
#[derive(Clone)]
pub struct SiteCrawler {
    browser: BrowserPool,
    llm: Option<Arc<LlmClient>>,
    observer: Arc<dyn PageObserver>,
    fetch_slots: Arc<Semaphore>,
    page_timeout: Duration,
    max_items: usize,
}

impl SiteCrawler {
    #[must_use]
    pub fn new(
        browser: BrowserPool,
        llm: Option<Arc<LlmClient>>,
        observer: Arc<dyn PageObserver>,
        max_concurrent_fetches: usize,
        page_timeout: Duration,
        max_items: usize,
    ) -> Self {
        Self {
            browser,
            llm,
            observer,
            fetch_slots: Arc::new(Semaphore::new(max_concurrent_fetches.max(1))),
            page_timeout,
            max_items,
        }
    }

    pub async fn crawl(&self, url: &str, site: &SearchEngineConfig) -> Vec<ProductRecord> {
        // Fetch sessions are bounded; extraction below runs outside the slot
        // so a slow LLM stage does not starve other sites' fetches.
        let permit = match Arc::clone(&self.fetch_slots).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!(site = %site.name, error = %e, "fetch slot unavailable");
                return Vec::new();
            }
        };

        let html = match self
            .browser
            .fetch_page(url, &site.wait_for, site.interaction, self.page_timeout)
            .await
        {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(site = %site.name, url, error = %e, "fetch failed; site contributes no records");
                return Vec::new();
            }
        };
        drop(permit);

        self.observer.page_fetched(&site.name, &html);

        let cascade = Cascade::new(self.llm.as_deref(), self.max_items);
        let outcome = cascade.extract(&html, site).await;

        let records: Vec<ProductRecord> = outcome
            .records
            .into_iter()
            .filter_map(|raw| normalize_record(raw, site, outcome.method))
            .collect();

        tracing::info!(
            site = %site.name,
            method = %outcome.method,
            stages_tried = outcome.attempts.len(),
            records = records.len(),
            "site crawl complete"
        );
        records
    }
}
