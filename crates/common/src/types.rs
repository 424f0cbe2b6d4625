//! Domain types shared across the dashboard.

use serde::{Deserialize, Serialize};

// ── Credentials ───────────────────────────────────────────────────────

/// Exchange API credentials a user registered with the dashboard.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeCredential {
    /// Local record id (the `pid` the hub addresses).
    pub id: i64,
    /// Platform exchange id, e.g. "Huobi" or "OKCoin_EN".
    pub eid: String,
    /// User supplied label.
    #[serde(default)]
    pub label: String,
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for ExchangeCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeCredential")
            .field("id", &self.id)
            .field("eid", &self.eid)
            .field("label", &self.label)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

// ── Exchange catalog ──────────────────────────────────────────────────

/// One entry of the platform's `symbols.json` exchange catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    pub eid: String,
    #[serde(default)]
    pub name: String,
    /// Comma separated trading pairs; the first one is the default.
    #[serde(default)]
    pub stocks: String,
    #[serde(default)]
    pub symbols: serde_json::Value,
    /// Fields the dashboard does not interpret, kept for pass-through.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExchangeInfo {
    /// First pair listed in `stocks`, if any.
    pub fn default_stock(&self) -> Option<&str> {
        self.stocks
            .split(',')
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

// ── Robots and strategies ─────────────────────────────────────────────

/// A strategy as returned by `GetStrategyList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// A robot as returned by `GetRobotList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Platform status code; values below 3 mean the robot is live.
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub profit: f64,
}

impl RobotSummary {
    pub fn is_running(&self) -> bool {
        self.status < 3
    }
}

/// What the dashboard shows for a user's robots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStatus {
    /// Robot to restart on the next run, -1 when the user has none.
    pub robot_id: i64,
    pub profit: f64,
    pub running: bool,
}
