use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub sites_path: PathBuf,
    pub user_agent: String,
    /// Per-page fetch timeout. Generous because interactive rendering is slow.
    pub page_timeout_secs: u64,
    pub max_concurrent_sites: usize,
    /// Cap on parsed items per site search page.
    pub max_items_per_site: usize,
    /// When set, fetched HTML is dumped here for selector debugging.
    pub debug_dump_dir: Option<PathBuf>,
    pub llm_api_base: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("sites_path", &self.sites_path)
            .field("user_agent", &self.user_agent)
            .field("page_timeout_secs", &self.page_timeout_secs)
            .field("max_concurrent_sites", &self.max_concurrent_sites)
            .field("max_items_per_site", &self.max_items_per_site)
            .field("debug_dump_dir", &self.debug_dump_dir)
            .field("llm_api_base", &self.llm_api_base)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .finish()
    }
}
