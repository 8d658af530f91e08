/// Configuration system for agentmon.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::MonitorConfig::default()`]
/// 2. **User global config**: `~/.agentmon/config.toml`
/// 3. **Project local config**: `.agentmon.toml` in the current working directory
/// 4. **Environment variables**: `AGENTMON_*` overrides (highest precedence)
///
/// Later layers replace earlier ones. Malformed files are ignored so a typo
/// in a config file never takes the dashboard down.
///
/// # Usage
///
/// ```rust,ignore
/// use agentmon::config;
///
/// let cfg = config::load();
/// let interval = cfg.poller.interval();
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::MonitorConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> MonitorConfig {
    let mut config = MonitorConfig::default();

    if let Some(global) = load_toml_file(global_config_file()) {
        merge_config(&mut config, &global);
    }

    if let Some(project) = load_toml_file(project_config_file()) {
        merge_config(&mut config, &project);
    }

    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed.
fn load_toml_file(path: Option<PathBuf>) -> Option<MonitorConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge a loaded config layer into the base config.
///
/// Each file is deserialized with `serde(default)`, so keys a user did not
/// set already carry the built-in defaults. The overlay therefore replaces
/// the base outright.
fn merge_config(base: &mut MonitorConfig, overlay: &MonitorConfig) {
    *base = overlay.clone();
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding agentmon's user-level files: `~/.agentmon/`.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".agentmon"))
}

/// `~/.agentmon/config.toml`, written by `config init|set|reset`.
pub fn global_config_file() -> Option<PathBuf> {
    home_dir().map(|dir| dir.join("config.toml"))
}

/// `.agentmon.toml` in the working directory.
pub fn project_config_file() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".agentmon.toml"))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_path(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `AGENTMON_API_URL`: base URL of the log API
/// - `AGENTMON_TIMEOUT_MS`: per-request timeout (`0` disables)
/// - `AGENTMON_POLL_INTERVAL_MS`: refresh interval
/// - `AGENTMON_WEB_ADDR`: bind address of the web dashboard
/// - `AGENTMON_DIAGNOSTICS`: diagnostics file on/off
fn apply_env_overrides(config: &mut MonitorConfig) {
    if let Ok(val) = std::env::var("AGENTMON_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("AGENTMON_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("AGENTMON_POLL_INTERVAL_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.poller.interval_ms = ms;
    }
    if let Ok(val) = std::env::var("AGENTMON_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Ok(val) = std::env::var("AGENTMON_DIAGNOSTICS") {
        config.diagnostics.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.agentmon/config.toml`.
///
/// Returns an error if the file already exists, unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_file().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.agentmon/ directory")?;
    }

    fs::write(&path, MonitorConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `poller.interval_ms`) in the global config.
///
/// The existing file is edited as a TOML value tree so unrelated keys
/// survive. Without a file, the defaults are
/// serialized first and then updated.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_file().context("could not determine home directory")?;

    let source = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&MonitorConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&source).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that no longer deserialize into the schema.
    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<MonitorConfig>(&updated)
        .with_context(|| format!("value '{value}' is not valid for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value keeps the type of the value it replaces.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }
    let (&leaf, sections) = parts.split_last().context("empty config key")?;

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table for '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
