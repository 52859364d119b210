// ⚙️ Configuration - upstream API + local storage settings
//
// Resolution order: command-line flag > environment variable > default.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://brasilapi.com.br/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_BACKOFF_MS: u64 = 500;
pub const DEFAULT_DB_PATH: &str = "brasil-dashboard.db";

/// Settings for the BrasilAPI client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after the first one, for retryable failures only
    pub retries: u32,
    /// Delay before the first retry; doubles on each further attempt
    pub backoff: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Full URL for a path such as `/banks/v1`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Flags shared by the CLI and the server binary
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// BrasilAPI base URL
    #[arg(long, env = "BRASIL_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "BRASIL_API_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Retries for network/timeout/5xx failures
    #[arg(long, env = "BRASIL_API_RETRIES", default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,

    /// SQLite file holding search history and the lookup log
    #[arg(long, env = "BRASIL_DASHBOARD_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,
}

impl ConfigArgs {
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            ..ApiConfig::default()
        }
        .with_base_url(&self.base_url)
        .with_retries(self.retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        config: ConfigArgs,
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "https://brasilapi.com.br/api");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.retries, 2);
    }

    #[test]
    fn test_url_joining() {
        let config = ApiConfig::default().with_base_url("http://localhost:8080/api/");
        assert_eq!(config.url("/banks/v1"), "http://localhost:8080/api/banks/v1");
        assert_eq!(config.url("taxas/v1"), "http://localhost:8080/api/taxas/v1");
    }

    #[test]
    fn test_backoff_doubles() {
        let config = ApiConfig::default().with_backoff(Duration::from_millis(100));
        assert_eq!(config.backoff_for(1), Duration::from_millis(100));
        assert_eq!(config.backoff_for(2), Duration::from_millis(200));
        assert_eq!(config.backoff_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_flags_override_defaults() {
        let harness = Harness::try_parse_from([
            "test",
            "--base-url",
            "http://127.0.0.1:9/api",
            "--timeout-secs",
            "3",
            "--retries",
            "0",
            "--db",
            "/tmp/x.db",
        ])
        .unwrap();

        let api = harness.config.api_config();
        assert_eq!(api.base_url, "http://127.0.0.1:9/api");
        assert_eq!(api.timeout, Duration::from_secs(3));
        assert_eq!(api.retries, 0);
        assert_eq!(harness.config.db, PathBuf::from("/tmp/x.db"));
    }
}
