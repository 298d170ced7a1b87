use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Identity of a supported marketplace, selecting the registered heuristic
/// parser. Sites without a dedicated parser use `Generic`, which drives the
/// configured selector chains directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteId {
    Amazon,
    Aliexpress,
    Generic,
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteId::Amazon => write!(f, "amazon"),
            SiteId::Aliexpress => write!(f, "aliexpress"),
            SiteId::Generic => write!(f, "generic"),
        }
    }
}

/// Ordered selector-fallback chains, one per logical field. The first
/// selector that yields non-empty text wins. A selector may carry an
/// attribute suffix (`"h2 a@href"`) to extract an attribute instead of
/// text; a bare `"@href"` reads the attribute off the item root itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSelectors {
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub price: Vec<String>,
    #[serde(default)]
    pub url: Vec<String>,
    #[serde(default)]
    pub rating: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<String>,
    #[serde(default)]
    pub seller: Vec<String>,
}

/// Static per-site search configuration. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEngineConfig {
    pub name: String,
    pub id: SiteId,
    /// Search URL template; the encoded query is appended.
    pub search_url: String,
    /// Base URL for resolving relative product links.
    pub base_url: String,
    /// DOM selector the fetch waits for before capturing HTML.
    pub wait_for: String,
    /// Run the randomized scroll interaction after navigation.
    #[serde(default)]
    pub interaction: bool,
    /// Ordered fallbacks for the result-item container selector.
    pub item_selectors: Vec<String>,
    #[serde(default)]
    pub fields: FieldSelectors,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SearchEngineConfig>,
}

impl SitesFile {
    /// Compiled-in site tables used when no `sites.yaml` is present.
    #[must_use]
    pub fn default_sites() -> Self {
        Self {
            sites: vec![amazon_defaults(), aliexpress_defaults()],
        }
    }
}

fn amazon_defaults() -> SearchEngineConfig {
    let chain = |items: &[&str]| items.iter().map(ToString::to_string).collect();
    SearchEngineConfig {
        name: "Amazon".to_string(),
        id: SiteId::Amazon,
        search_url: "https://www.amazon.com/s?k=".to_string(),
        base_url: "https://www.amazon.com".to_string(),
        wait_for: "div.s-result-item".to_string(),
        interaction: true,
        item_selectors: chain(&[
            "div.s-result-item[data-component-type='s-search-result']",
            "div.s-result-item[data-asin]:not([data-asin=''])",
        ]),
        fields: FieldSelectors {
            title: chain(&[
                "h2 a.a-link-normal span.a-text-normal",
                "h2.a-size-base-plus span",
                "h2 span",
            ]),
            price: chain(&["span.a-price span.a-offscreen", "span.a-price"]),
            url: chain(&["h2 a.a-link-normal@href", "a.a-link-normal.s-no-outline@href"]),
            rating: chain(&["i.a-icon-star-small span.a-icon-alt", "span.a-icon-alt"]),
            reviews: chain(&["span.a-size-base.s-underline-text", "span.a-size-base"]),
            seller: vec![],
        },
    }
}

fn aliexpress_defaults() -> SearchEngineConfig {
    let chain = |items: &[&str]| items.iter().map(ToString::to_string).collect();
    SearchEngineConfig {
        name: "AliExpress".to_string(),
        id: SiteId::Aliexpress,
        search_url: "https://www.aliexpress.com/wholesale?SearchText=".to_string(),
        base_url: "https://www.aliexpress.com".to_string(),
        wait_for: "a.search-card-item".to_string(),
        interaction: true,
        item_selectors: chain(&["a.search-card-item", "div.search-item-card-wrapper-gallery a"]),
        fields: FieldSelectors {
            title: chain(&["h3.kc_j0", "h1", "h3"]),
            price: chain(&["div.kc_k1", "div.multi--price-sale--U-S0Mn"]),
            url: chain(&["@href"]),
            rating: chain(&["div.kc_j7 span.kc_jv"]),
            reviews: chain(&["div.kc_j7 span.kc_jv:last-child"]),
            seller: chain(&["span.io_ip a.io_ir"]),
        },
    }
}

/// Load and validate the site configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sites_file: SitesFile = serde_yaml::from_str(&content)?;
    validate_sites(&sites_file)?;
    Ok(sites_file)
}

/// Load sites from `path`, falling back to the compiled-in defaults when the
/// file does not exist. Parse and validation failures still error: a present
/// but broken table should not be silently replaced.
///
/// # Errors
///
/// Returns `ConfigError` on parse or validation failure.
pub fn load_sites_or_default(path: &Path) -> Result<SitesFile, ConfigError> {
    if path.exists() {
        load_sites(path)
    } else {
        tracing::info!(path = %path.display(), "sites file not found; using built-in site tables");
        Ok(SitesFile::default_sites())
    }
}

fn validate_sites(sites_file: &SitesFile) -> Result<(), ConfigError> {
    if sites_file.sites.is_empty() {
        return Err(ConfigError::Validation(
            "sites file must configure at least one site".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    for site in &sites_file.sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site name must be non-empty".to_string(),
            ));
        }
        if site.search_url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty search_url",
                site.name
            )));
        }
        if site.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty base_url",
                site.name
            )));
        }
        if site.item_selectors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' must configure at least one item selector",
                site.name
            )));
        }
        if !seen_names.insert(site.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name: '{}'",
                site.name
            )));
        }
    }

    Ok(())
}
