//! Dashboard configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::ExchangeCredential;

/// Top-level dashboard configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Platform API access key.
    #[serde(default)]
    pub access_key: String,

    /// Platform API secret, only ever used as signature input.
    #[serde(default)]
    pub secret_key: String,

    /// RPC endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Exchange catalog endpoint.
    #[serde(default = "default_symbols_url")]
    pub symbols_url: String,

    /// Upper bound for a single remote call.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Freshness window for cached RPC results.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Dashboard user the CLI acts as.
    #[serde(default = "default_user_id")]
    pub user_id: i64,

    /// Registered exchange credentials.
    #[serde(default)]
    pub exchanges: Vec<ExchangeCredential>,
}

impl DashboardConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("symbols_url", &self.symbols_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("user_id", &self.user_id)
            .field("exchanges", &self.exchanges)
            .finish()
    }
}

fn default_api_url() -> String {
    "https://www.fmz.com/api/v1".into()
}
fn default_symbols_url() -> String {
    "https://www.fmz.com/chart/symbols.json".into()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_cache_ttl() -> u64 {
    600
}
fn default_user_id() -> i64 {
    1
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            api_url: default_api_url(),
            symbols_url: default_symbols_url(),
            request_timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl(),
            user_id: default_user_id(),
            exchanges: Vec::new(),
        }
    }
}
