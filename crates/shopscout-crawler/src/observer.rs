//! Side-channel instrumentation for fetched pages.
//!
//! Debug artifacts are useful when a site's selectors rot, but writing them
//! must never affect a crawl. Fetch code reports pages to a [`PageObserver`];
//! the observer decides whether anything hits disk.

use std::path::PathBuf;

/// Receives every successfully fetched page. Implementations must be
/// best-effort: failures are theirs to swallow.
pub trait PageObserver: Send + Sync {
    fn page_fetched(&self, site_name: &str, html: &str);
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl PageObserver for NoopObserver {
    fn page_fetched(&self, _site_name: &str, _html: &str) {}
}

/// Cap on dumped HTML. Search pages run to megabytes; the head is enough to
/// debug selectors.
const DUMP_MAX_BYTES: usize = 20_000;

/// Writes `debug_<site>.html` files into a directory for selector debugging.
#[derive(Debug)]
pub struct HtmlDumpObserver {
    dir: PathBuf,
}

impl HtmlDumpObserver {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl PageObserver for HtmlDumpObserver {
    fn page_fetched(&self, site_name: &str, html: &str) {
        let slug: String = site_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        let path = self.dir.join(format!("debug_{slug}.html"));

        let mut end = html.len().min(DUMP_MAX_BYTES);
        while end < html.len() && !html.is_char_boundary(end) {
            end += 1;
        }

        let result = std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(&path, &html[..end]));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "debug HTML dump failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("shopscout-observer-{name}-{}", std::process::id()))
    }

    #[test]
    fn dump_writes_truncated_html() {
        let dir = temp_dir("truncate");
        let observer = HtmlDumpObserver::new(dir.clone());
        let html = "x".repeat(DUMP_MAX_BYTES * 2);
        observer.page_fetched("Amazon", &html);

        let written = std::fs::read_to_string(dir.join("debug_amazon.html")).unwrap();
        assert_eq!(written.len(), DUMP_MAX_BYTES);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn dump_slugifies_site_name() {
        let dir = temp_dir("slug");
        let observer = HtmlDumpObserver::new(dir.clone());
        observer.page_fetched("Ali Express!", "<html></html>");

        assert!(dir.join("debug_ali_express_.html").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn dump_failure_does_not_panic() {
        // A path that cannot be created: a file stands where the dir should be.
        let base = temp_dir("blocked");
        std::fs::create_dir_all(&base).unwrap();
        let blocker = base.join("blocker");
        std::fs::write(&blocker, "file").unwrap();

        let observer = HtmlDumpObserver::new(blocker.join("nested"));
        observer.page_fetched("Amazon", "<html></html>");
        std::fs::remove_dir_all(&base).ok();
    }
}
