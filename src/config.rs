//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. The `RUST_LOG` environment
//! variable, when set, overrides the configured log level.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use crate::domain::tenant::{ModuleConfig, Tenant};
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Market-status feed settings.
    pub feed: FeedConfig,

    /// Path to the SQLite database file (`:memory:` for ephemeral runs).
    #[serde(default = "default_database")]
    pub database: String,

    /// Polling loop settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Leagues this deployment orchestrates.
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

/// Market-status feed settings.
#[derive(Debug, Default, Deserialize)]
pub struct FeedConfig {
    /// Endpoint returning the current market status document.
    pub status_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_feed_timeout_secs")]
    pub timeout_secs: u64,
}

/// Polling loop settings.
#[derive(Debug, Deserialize)]
pub struct PollingConfig {
    /// Interval between market-status polls, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound on a single manager hook invocation, in milliseconds.
    /// A hook exceeding this is treated exactly like a failed hook.
    #[serde(default = "default_hook_timeout_ms")]
    pub hook_timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            hook_timeout_ms: default_hook_timeout_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

/// One league entry in the config file.
#[derive(Debug, Deserialize)]
pub struct TenantConfig {
    pub id: String,
    pub name: String,

    #[serde(default = "default_true")]
    pub active: bool,

    /// Per-module enablement, keyed by module key.
    #[serde(default)]
    pub modules: HashMap<String, bool>,
}

impl TenantConfig {
    /// Convert into the domain tenant, with config entries landing in the
    /// explicit per-module map (highest precedence).
    #[must_use]
    pub fn to_tenant(&self) -> Tenant {
        let configured = self
            .modules
            .iter()
            .map(|(key, enabled)| (key.clone(), ModuleConfig { enabled: *enabled }))
            .collect();

        Tenant {
            id: self.id.clone(),
            name: self.name.clone(),
            active: self.active,
            configured_modules: configured,
            legacy_modules: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Initialize logging from the embedded logging section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Active tenants as domain values.
    #[must_use]
    pub fn active_tenants(&self) -> Vec<Tenant> {
        self.tenants
            .iter()
            .filter(|t| t.active)
            .map(TenantConfig::to_tenant)
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.feed.status_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "feed.status_url",
            }
            .into());
        }
        Url::parse(&self.feed.status_url).map_err(|e| ConfigError::InvalidValue {
            field: "feed.status_url",
            reason: e.to_string(),
        })?;
        if self.database.is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval_ms",
                reason: "must be greater than zero".into(),
            }
            .into());
        }
        if self.polling.hook_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.hook_timeout_ms",
                reason: "must be greater than zero".into(),
            }
            .into());
        }
        Ok(())
    }
}

fn default_database() -> String {
    "roundlord.db".into()
}

fn default_feed_timeout_secs() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    120_000
}

fn default_hook_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [feed]
        status_url = "https://market.example.com/status"
    "#;

    #[test]
    fn parse_minimal_config_applies_defaults() {
        let config = Config::parse_toml(MINIMAL).unwrap();
        assert_eq!(config.database, "roundlord.db");
        assert_eq!(config.polling.interval_ms, 120_000);
        assert_eq!(config.polling.hook_timeout_ms, 30_000);
        assert!(config.tenants.is_empty());
    }

    #[test]
    fn missing_feed_url_is_rejected() {
        let result = Config::parse_toml("[feed]\nstatus_url = \"\"");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_feed_url_is_rejected() {
        let result = Config::parse_toml("[feed]\nstatus_url = \"not a url\"");
        assert!(result.is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let toml = r#"
            [feed]
            status_url = "https://market.example.com/status"
            [polling]
            interval_ms = 0
        "#;
        assert!(Config::parse_toml(toml).is_err());
    }

    #[test]
    fn tenants_become_explicit_module_config() {
        let toml = r#"
            [feed]
            status_url = "https://market.example.com/status"

            [[tenants]]
            id = "league-1"
            name = "Premier"
            [tenants.modules]
            top_scorer = true
            knockout = false

            [[tenants]]
            id = "league-2"
            name = "Dormant"
            active = false
        "#;
        let config = Config::parse_toml(toml).unwrap();
        let tenants = config.active_tenants();
        assert_eq!(tenants.len(), 1);
        assert!(tenants[0].module_enabled("top_scorer"));
        assert!(!tenants[0].module_enabled("knockout"));
    }
}
