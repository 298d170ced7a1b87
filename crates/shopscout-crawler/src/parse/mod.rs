//! Heuristic extraction of last resort: hand-written per-site parsers over
//! ordered selector-fallback chains.
//!
//! Parser selection goes through the [`SiteId`] variant set rather than
//! string matching on site names; sites without a dedicated parser get the
//! [`GenericParser`], which drives the chains configured in the site table.

mod aliexpress;
mod amazon;
mod generic;
pub(crate) mod helpers;

pub use aliexpress::AliExpressParser;
pub use amazon::AmazonParser;
pub use generic::GenericParser;

use shopscout_core::{SearchEngineConfig, SiteId};

use crate::types::RawProduct;

/// One site's DOM-to-record mapping. Implementations must not fail on
/// malformed markup: an item that cannot be parsed is skipped and its
/// siblings are still processed.
pub trait SiteParser: Send + Sync {
    fn parse(&self, html: &str, site: &SearchEngineConfig, max_items: usize) -> Vec<RawProduct>;
}

/// Registered parser for a site identity.
#[must_use]
pub fn parser_for(id: SiteId) -> &'static dyn SiteParser {
    match id {
        SiteId::Amazon => &AmazonParser,
        SiteId::Aliexpress => &AliExpressParser,
        SiteId::Generic => &GenericParser,
    }
}

#[cfg(test)]
mod tests {
    use shopscout_core::SitesFile;

    use super::*;

    #[test]
    fn registry_covers_every_site_id() {
        for id in [SiteId::Amazon, SiteId::Aliexpress, SiteId::Generic] {
            // A registered parser must tolerate arbitrary markup without
            // producing records from nothing.
            let site = SitesFile::default_sites().sites.remove(0);
            let records = parser_for(id).parse("<html><body></body></html>", &site, 10);
            assert!(records.is_empty());
        }
    }

    #[test]
    fn parsers_never_fail_on_malformed_markup() {
        let site = SitesFile::default_sites().sites.remove(0);
        let mangled = "<div class='s-result-item'><h2><span>Unclosed";
        for id in [SiteId::Amazon, SiteId::Aliexpress, SiteId::Generic] {
            let _ = parser_for(id).parse(mangled, &site, 10);
        }
    }
}
