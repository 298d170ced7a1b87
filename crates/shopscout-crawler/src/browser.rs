//! Headless-browser page fetching.
//!
//! One Chromium instance is launched lazily and shared across site crawls;
//! every fetch opens its own page (tab), so concurrent crawls never observe
//! each other's in-flight DOM state.

use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use rand::Rng;
use tokio::sync::Mutex;

use crate::error::CrawlerError;

/// Poll interval for the wait-condition selector.
const WAIT_POLL_MS: u64 = 500;

/// Best-effort cap on the initial navigation wait.
const NAVIGATION_WAIT_SECS: u64 = 10;

/// Lazily launched, shared headless Chromium.
#[derive(Clone)]
pub struct BrowserPool {
    inner: Arc<Mutex<Option<Arc<Browser>>>>,
    user_agent: String,
}

impl BrowserPool {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
            user_agent: user_agent.to_owned(),
        }
    }

    async fn get_or_launch(&self) -> Result<Arc<Browser>, CrawlerError> {
        let mut guard = self.inner.lock().await;
        if let Some(browser) = guard.as_ref() {
            return Ok(Arc::clone(browser));
        }

        let config = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.user_agent))
            .window_size(1280, 720)
            .build()
            .map_err(|e| CrawlerError::Browser(format!("browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlerError::Browser(format!("browser launch failed: {e}")))?;

        // The handler must be driven for the CDP connection to make progress.
        tokio::spawn(async move { while handler.next().await.is_some() {} });

        let shared = Arc::new(browser);
        *guard = Some(Arc::clone(&shared));
        Ok(shared)
    }

    /// Closes the shared browser if this pool holds the last reference.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.lock().await;
        if let Some(browser) = guard.take() {
            if let Ok(mut browser) = Arc::try_unwrap(browser) {
                if let Err(e) = browser.close().await {
                    tracing::warn!(error = %e, "browser close error");
                }
            }
        }
    }

    /// Navigates to `url`, optionally runs the randomized interaction
    /// script, waits for `wait_for` to appear in the DOM, and returns the
    /// fully rendered HTML.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Fetch`] on navigation failure, timeout, or
    /// browser crash. Callers above the site crawler never see this error —
    /// it collapses to an empty contribution for the site.
    pub async fn fetch_page(
        &self,
        url: &str,
        wait_for: &str,
        interaction: bool,
        timeout: Duration,
    ) -> Result<String, CrawlerError> {
        let fetch_err = |reason: String| CrawlerError::Fetch {
            url: url.to_owned(),
            reason,
        };

        let browser = self.get_or_launch().await?;
        let deadline = tokio::time::Instant::now() + timeout;

        let page = tokio::time::timeout_at(deadline, browser.new_page(url))
            .await
            .map_err(|_| fetch_err("timed out opening page".to_owned()))?
            .map_err(|e| fetch_err(format!("failed to open page: {e}")))?;

        let _ = tokio::time::timeout(
            Duration::from_secs(NAVIGATION_WAIT_SECS),
            page.wait_for_navigation(),
        )
        .await;

        if interaction {
            // Anti-bot nicety, not a correctness requirement: failures are
            // logged and the fetch continues.
            if let Err(e) = page.evaluate(interaction_script()).await {
                tracing::debug!(url, error = %e, "interaction script failed");
            }
        }

        // Poll for the wait condition until the deadline.
        loop {
            if page.find_element(wait_for).await.is_ok() {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                let _ = page.close().await;
                return Err(fetch_err(format!(
                    "wait condition \"{wait_for}\" not satisfied within {}s",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(Duration::from_millis(WAIT_POLL_MS)).await;
        }

        let html = tokio::time::timeout_at(deadline, page.content())
            .await
            .map_err(|_| fetch_err("timed out capturing page content".to_owned()))?
            .map_err(|e| fetch_err(format!("failed to capture content: {e}")))?;

        if let Err(e) = page.close().await {
            tracing::debug!(url, error = %e, "page close error (tab leak)");
        }

        Ok(html)
    }
}

/// Builds the scroll interaction as an async IIFE. Scroll count, amplitude,
/// and inter-scroll delay are drawn fresh on every call so repeated fetches
/// do not produce an identical interaction signature.
fn interaction_script() -> String {
    let mut rng = rand::rng();
    let scrolls: u32 = rng.random_range(2..=4);
    let mut steps = String::new();
    for _ in 0..scrolls {
        let amplitude: u32 = rng.random_range(200..=600);
        let delay_ms: u32 = rng.random_range(300..=1000);
        steps.push_str(&format!(
            "window.scrollBy(0, {amplitude}); await new Promise(r => setTimeout(r, {delay_ms}));\n"
        ));
    }
    format!("(async () => {{\n{steps}}})()")
}
