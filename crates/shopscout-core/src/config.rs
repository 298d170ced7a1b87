use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("SHOPSCOUT_ENV", "development"));

    let bind_addr = parse_addr("SHOPSCOUT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SHOPSCOUT_LOG_LEVEL", "info");
    let sites_path = PathBuf::from(or_default("SHOPSCOUT_SITES_PATH", "./config/sites.yaml"));

    let user_agent = or_default(
        "SHOPSCOUT_USER_AGENT",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    );
    let page_timeout_secs = parse_u64("SHOPSCOUT_PAGE_TIMEOUT_SECS", "300")?;
    let max_concurrent_sites = parse_usize("SHOPSCOUT_MAX_CONCURRENT_SITES", "4")?;
    let max_items_per_site = parse_usize("SHOPSCOUT_MAX_ITEMS_PER_SITE", "10")?;
    let debug_dump_dir = lookup("SHOPSCOUT_DEBUG_DUMP_DIR").ok().map(PathBuf::from);

    let llm_api_base = or_default("SHOPSCOUT_LLM_API_BASE", "http://localhost:11434/v1");
    let llm_api_key = lookup("SHOPSCOUT_LLM_API_KEY").ok();
    let llm_model = or_default("SHOPSCOUT_LLM_MODEL", "llama3");
    let llm_timeout_secs = parse_u64("SHOPSCOUT_LLM_TIMEOUT_SECS", "120")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        sites_path,
        user_agent,
        page_timeout_secs,
        max_concurrent_sites,
        max_items_per_site,
        debug_dump_dir,
        llm_api_base,
        llm_api_key,
        llm_model,
        llm_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_development() {
        assert_eq!(parse_environment("development"), Environment::Development);
    }

    #[test]
    fn parse_environment_test() {
        assert_eq!(parse_environment("test"), Environment::Test);
    }

    #[test]
    fn parse_environment_production() {
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("unknown"), Environment::Development);
    }

    #[test]
    fn build_app_config_succeeds_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.page_timeout_secs, 300);
        assert_eq!(cfg.max_concurrent_sites, 4);
        assert_eq!(cfg.max_items_per_site, 10);
        assert!(cfg.debug_dump_dir.is_none());
        assert_eq!(cfg.llm_api_base, "http://localhost:11434/v1");
        assert!(cfg.llm_api_key.is_none());
        assert_eq!(cfg.llm_model, "llama3");
        assert_eq!(cfg.llm_timeout_secs, 120);
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPSCOUT_BIND_ADDR"),
            "expected InvalidEnvVar(SHOPSCOUT_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn page_timeout_secs_override() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_PAGE_TIMEOUT_SECS", "60");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.page_timeout_secs, 60);
    }

    #[test]
    fn page_timeout_secs_invalid() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_PAGE_TIMEOUT_SECS", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPSCOUT_PAGE_TIMEOUT_SECS"),
            "expected InvalidEnvVar(SHOPSCOUT_PAGE_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn max_concurrent_sites_override() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_MAX_CONCURRENT_SITES", "8");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.max_concurrent_sites, 8);
    }

    #[test]
    fn max_concurrent_sites_invalid() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_MAX_CONCURRENT_SITES", "many");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHOPSCOUT_MAX_CONCURRENT_SITES"),
            "expected InvalidEnvVar(SHOPSCOUT_MAX_CONCURRENT_SITES), got: {result:?}"
        );
    }

    #[test]
    fn debug_dump_dir_set_when_present() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_DEBUG_DUMP_DIR", "/tmp/shopscout-dumps");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.debug_dump_dir.as_deref(),
            Some(std::path::Path::new("/tmp/shopscout-dumps"))
        );
    }

    #[test]
    fn llm_api_key_optional() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_LLM_API_KEY", "sk-test");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.llm_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn llm_model_override() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_LLM_MODEL", "qwen2.5");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.llm_model, "qwen2.5");
    }

    #[test]
    fn debug_redacts_llm_api_key() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("SHOPSCOUT_LLM_API_KEY", "sk-very-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
