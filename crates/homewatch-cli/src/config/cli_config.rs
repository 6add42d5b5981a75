//! CLI configuration file support
//!
//! Loads configuration from ~/.config/homewatch/config.toml

use homewatch_core::clients::{DEFAULT_NPM_REGISTRY, DEFAULT_NTFY_SERVER};
use homewatch_core::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_HOME_ASSISTANT_URL: &str = "http://homeassistant.local:8123";
pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:10444/homewatch";
pub const DEFAULT_HOST_PLUGIN: &str = "@homewatch/scheduler";

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub default: DefaultConfig,
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub ntfy: NtfyConfig,
    #[serde(default)]
    pub npm: NpmConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Default database path
    pub db_path: Option<String>,
    /// Notifier used when the store has no `defaultNotifier`
    pub default_notifier: Option<String>,
    /// Package name of the plugin running the scheduler
    pub host_plugin: Option<String>,
    /// Seconds between configuration checks
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    pub url: Option<String>,
    /// Long-lived access token
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NtfyConfig {
    pub server: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpmConfig {
    pub registry: Option<String>,
}

impl CliConfig {
    /// Load configuration from `path`, or the default path when `None`.
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from_path(Some(path.to_path_buf())),
            None => Self::load_from_path(Self::default_path()),
        }
    }

    /// Load configuration from a specific path; missing or malformed files yield defaults.
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "Ignoring malformed config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        paths::config_path()
    }

    pub fn home_assistant_url(&self) -> &str {
        self.home_assistant
            .url
            .as_deref()
            .unwrap_or(DEFAULT_HOME_ASSISTANT_URL)
    }

    pub fn bridge_url(&self) -> &str {
        self.bridge.url.as_deref().unwrap_or(DEFAULT_BRIDGE_URL)
    }

    pub fn ntfy_server(&self) -> &str {
        self.ntfy.server.as_deref().unwrap_or(DEFAULT_NTFY_SERVER)
    }

    pub fn npm_registry(&self) -> &str {
        self.npm.registry.as_deref().unwrap_or(DEFAULT_NPM_REGISTRY)
    }

    pub fn host_plugin(&self) -> &str {
        self.default
            .host_plugin
            .as_deref()
            .unwrap_or(DEFAULT_HOST_PLUGIN)
    }
}
