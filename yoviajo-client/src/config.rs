use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const PRODUCTION_API_URL: &str = "https://api.yoviajo.com.ar/api";
pub const STAGING_API_URL: &str = "https://yoviajo-backend.onrender.com/api";
pub const LOCAL_API_URL: &str = "http://localhost:8003/api";

/// Shortest timer period accepted from configuration.
const MIN_POLL_SECONDS: u64 = 1;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Explicit backend override. Takes precedence over host detection.
    pub base_url: Option<String>,
    /// Host the client is served from, used to pick production or staging.
    pub page_host: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: None, page_host: None, timeout_seconds: default_timeout() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_admin_stats_seconds")]
    pub admin_stats_seconds: u64,
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            admin_stats_seconds: default_admin_stats_seconds(),
            countdown_seconds: default_countdown_seconds(),
        }
    }
}

fn default_timeout() -> u64 { 30 }
fn default_admin_stats_seconds() -> u64 { 30 }
fn default_countdown_seconds() -> u64 { 60 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `YOVIAJO__API__BASE_URL=https://...`
            .add_source(config::Environment::with_prefix("YOVIAJO").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn api_url(&self) -> String {
        // The short form mirrors the build-time variable of the web client.
        let explicit = self.api.base_url.clone().or_else(|| env::var("YOVIAJO_API_URL").ok());
        resolve_api_url(explicit.as_deref(), self.api.page_host.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn admin_stats_period(&self) -> Duration {
        Duration::from_secs(self.polling.admin_stats_seconds.max(MIN_POLL_SECONDS))
    }

    pub fn countdown_period(&self) -> Duration {
        Duration::from_secs(self.polling.countdown_seconds.max(MIN_POLL_SECONDS))
    }

    pub fn session_path(&self) -> PathBuf {
        self.session.path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("yoviajo")
                .join("session.json")
        })
    }
}

/// Pick the backend base URL: explicit override, then host detection, then local.
pub fn resolve_api_url(explicit: Option<&str>, page_host: Option<&str>) -> String {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        let url = url.trim_end_matches('/');
        return if url.ends_with("/api") { url.to_string() } else { format!("{}/api", url) };
    }

    match page_host {
        Some(host) if host.contains("yoviajo.com.ar") => PRODUCTION_API_URL.to_string(),
        Some(host) if host.contains("onrender.com") => STAGING_API_URL.to_string(),
        _ => LOCAL_API_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_url_is_normalized() {
        assert_eq!(resolve_api_url(Some("https://x.example/"), None), "https://x.example/api");
        assert_eq!(resolve_api_url(Some("https://x.example/api/"), None), "https://x.example/api");
    }

    #[test]
    fn test_host_detection() {
        assert_eq!(resolve_api_url(None, Some("www.yoviajo.com.ar")), PRODUCTION_API_URL);
        assert_eq!(resolve_api_url(None, Some("yoviajo-front.onrender.com")), STAGING_API_URL);
        assert_eq!(resolve_api_url(None, None), LOCAL_API_URL);
        assert_eq!(resolve_api_url(Some("  "), Some("localhost")), LOCAL_API_URL);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.polling.countdown_seconds, 60);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.session_path().ends_with("yoviajo/session.json"));
    }

    #[test]
    fn test_zero_polling_period_is_clamped() {
        let mut config = Config::default();
        config.polling.admin_stats_seconds = 0;
        config.polling.countdown_seconds = 0;
        assert_eq!(config.admin_stats_period(), Duration::from_secs(1));
        assert_eq!(config.countdown_period(), Duration::from_secs(1));
        assert_eq!(Config::default().admin_stats_period(), Duration::from_secs(30));
    }
}
