/// Configuration schema and defaults for agentmon.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[poller]`, `[view]`, `[web]` and `[diagnostics]`.
///
/// Every field has a built-in default. Users only need to set the values they
/// want to override.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lower bound for the poll interval. Anything faster hammers the API for no
/// visible benefit.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level agentmon configuration.
///
/// Maps directly to `~/.agentmon/config.toml` and `.agentmon.toml`. All
/// sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub api: ApiConfig,
    pub poller: PollerConfig,
    pub view: ViewConfig,
    pub web: WebConfig,
    pub diagnostics: DiagnosticsConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Remote log API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the log API (without the `/api/logs` suffix).
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` leaves the HTTP client's
    /// default in place (no timeout).
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout_ms: 0,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

// ---------------------------------------------------------------------------
// [poller]
// ---------------------------------------------------------------------------

/// Refresh loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Time between scheduled polls (milliseconds).
    pub interval_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

impl PollerConfig {
    /// The effective interval, clamped to [`MIN_POLL_INTERVAL_MS`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

// ---------------------------------------------------------------------------
// [view]
// ---------------------------------------------------------------------------

/// Derived view and rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Number of points in the latency chart.
    pub chart_window: usize,
    /// Latencies at or above this value are flagged as slow.
    pub slow_latency_ms: u64,
    /// Maximum rows printed by the terminal table.
    pub max_rows: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            chart_window: 20,
            slow_latency_ms: 1000,
            max_rows: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Local web dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address for `agentmon web`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [diagnostics]
// ---------------------------------------------------------------------------

/// Diagnostic side channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Whether diagnostic events are written to the JSONL file.
    pub enabled: bool,
    /// Path to the diagnostics file. `~` is expanded to the home directory.
    pub path: String,
    /// Also print each event to stderr.
    pub echo_stderr: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.agentmon/diagnostics.jsonl".to_string(),
            echo_stderr: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl MonitorConfig {
    /// Annotated default config written by `agentmon config init`.
    pub fn default_toml() -> String {
        r#"# agentmon configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (AGENTMON_*)
#   2. Project config (.agentmon.toml in current directory)
#   3. User global config (~/.agentmon/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://localhost:8001"
timeout_ms = 0                 # 0 = no timeout

[poller]
interval_ms = 2000

[view]
chart_window = 20              # points in the latency chart
slow_latency_ms = 1000         # >= this is shown as slow
max_rows = 50                  # rows in the terminal table

[web]
addr = "127.0.0.1:9747"
open_browser = true

[diagnostics]
enabled = true
path = "~/.agentmon/diagnostics.jsonl"
echo_stderr = false
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_contract() {
        let config = MonitorConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8001");
        assert_eq!(config.poller.interval(), Duration::from_millis(2000));
        assert_eq!(config.view.chart_window, 20);
        assert_eq!(config.api.timeout(), None);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: MonitorConfig = toml::from_str(&MonitorConfig::default_toml()).unwrap();
        assert_eq!(config.poller.interval_ms, 2000);
        assert_eq!(config.web.addr, "127.0.0.1:9747");
        assert!(config.diagnostics.enabled);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: MonitorConfig = toml::from_str("[poller]\ninterval_ms = 5000\n").unwrap();
        assert_eq!(config.poller.interval_ms, 5000);
        assert_eq!(config.view.slow_latency_ms, 1000);
    }

    #[test]
    fn interval_is_clamped() {
        let poller = PollerConfig { interval_ms: 5 };
        assert_eq!(poller.interval(), Duration::from_millis(MIN_POLL_INTERVAL_MS));
    }

    #[test]
    fn timeout_enabled_when_positive() {
        let api = ApiConfig {
            timeout_ms: 1500,
            ..ApiConfig::default()
        };
        assert_eq!(api.timeout(), Some(Duration::from_millis(1500)));
    }
}
