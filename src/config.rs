//! Configuration loader — merges env vars, .env file, and config.toml.

use common::config::DashboardConfig;
use common::Error;
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_non_negative_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 0")))
}

fn validate_config(config: &DashboardConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.access_key.trim().is_empty() {
        issues.push("BOTVS_ACCESS_KEY is required (set in .env or environment)".into());
    }
    if config.secret_key.trim().is_empty() {
        issues.push("BOTVS_SECRET_KEY is required (set in .env or environment)".into());
    }
    if !config.api_url.starts_with("http://") && !config.api_url.starts_with("https://") {
        issues.push("api_url must be an http(s) URL".into());
    }
    if !config.symbols_url.starts_with("http://") && !config.symbols_url.starts_with("https://") {
        issues.push("symbols_url must be an http(s) URL".into());
    }
    if config.request_timeout_ms == 0 {
        issues.push("request_timeout_ms must be > 0".into());
    }
    if config.user_id <= 0 {
        issues.push("user_id must be > 0".into());
    }

    let mut seen = std::collections::HashSet::new();
    for cred in &config.exchanges {
        if !seen.insert(cred.id) {
            issues.push(format!("exchanges: duplicate id {}", cred.id));
        }
        if cred.eid.trim().is_empty() {
            issues.push(format!("exchanges[{}].eid must not be empty", cred.id));
        }
        if cred.access_key.is_empty() || cred.secret_key.is_empty() {
            issues.push(format!("exchanges[{}] needs both access_key and secret_key", cred.id));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load dashboard configuration from environment and an optional config file.
pub fn load_config(config_path: &Path) -> Result<DashboardConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = DashboardConfig::default();

    // 3. Try loading the config file if it exists.
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(key) = std::env::var("BOTVS_ACCESS_KEY") {
        config.access_key = key;
    }
    if let Ok(secret) = std::env::var("BOTVS_SECRET_KEY") {
        config.secret_key = secret;
    }
    if let Ok(url) = std::env::var("BOTVS_API_URL") {
        config.api_url = url.trim().to_string();
    }
    if let Ok(url) = std::env::var("BOTVS_SYMBOLS_URL") {
        config.symbols_url = url.trim().to_string();
    }
    if let Ok(raw) = std::env::var("BOTVS_TIMEOUT_MS") {
        config.request_timeout_ms = parse_positive_u64(&raw, "BOTVS_TIMEOUT_MS")?;
    }
    if let Ok(raw) = std::env::var("BOTVS_CACHE_TTL_SECS") {
        config.cache_ttl_secs = parse_non_negative_u64(&raw, "BOTVS_CACHE_TTL_SECS")?;
    }
    if let Ok(raw) = std::env::var("DASHBOARD_USER_ID") {
        config.user_id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::Config("DASHBOARD_USER_ID must be an integer".into()))?;
    }

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}
