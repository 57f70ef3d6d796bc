//! Application configuration loaded from environment variables.
//!
//! Adapter credentials are individually optional: a missing credential
//! disables that one adapter (it reports not-applicable on every run)
//! and is never a startup failure.

use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Terminal jobs kept in the store before oldest-first eviction.
    pub max_jobs: usize,
    /// Web scanner (ZAP-style) base URL; adapter disabled when unset.
    pub web_scanner_base_url: Option<String>,
    pub web_scanner_api_key: Option<String>,
    /// Dependency vulnerability database base URL (no credential needed).
    pub osv_base_url: String,
    /// Container scanner base URL; adapter disabled when unset.
    pub container_scanner_base_url: Option<String>,
    /// Static analysis service base URL and API key; adapter disabled
    /// when the key is unset.
    pub static_analysis_base_url: String,
    pub static_analysis_api_key: Option<String>,
    /// Source-host API base URL and access token; adapter disabled when
    /// the token is unset.
    pub source_host_base_url: String,
    pub source_host_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("SCANFORGE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SCANFORGE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            max_jobs: env::var("SCANFORGE_MAX_JOBS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            web_scanner_base_url: env::var("WEB_SCANNER_BASE_URL").ok(),
            web_scanner_api_key: env::var("WEB_SCANNER_API_KEY").ok(),
            osv_base_url: env::var("OSV_BASE_URL")
                .unwrap_or_else(|_| "https://api.osv.dev".to_string()),
            container_scanner_base_url: env::var("CONTAINER_SCANNER_BASE_URL").ok(),
            static_analysis_base_url: env::var("STATIC_ANALYSIS_BASE_URL")
                .unwrap_or_else(|_| "https://static-analysis.example.com".to_string()),
            static_analysis_api_key: env::var("STATIC_ANALYSIS_API_KEY").ok(),
            source_host_base_url: env::var("SOURCE_HOST_BASE_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            source_host_token: env::var("SOURCE_HOST_TOKEN").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them to defaults that do
    // not depend on variables being set.

    #[test]
    fn missing_credentials_are_none_not_errors() {
        let config = AppConfig::from_env();
        // Whatever the environment, loading never panics and the
        // always-available defaults are populated.
        assert!(!config.osv_base_url.is_empty());
        assert!(!config.source_host_base_url.is_empty());
        assert!(config.port > 0);
    }
}
