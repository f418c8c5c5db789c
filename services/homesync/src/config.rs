//! Configuration types for the homesync service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::snapshot::{Actuator, PathGroup};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Store configuration with tagged enum for extensibility
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// Realtime database reached over its REST streaming API
    #[serde(rename = "rest")]
    Rest {
        base_url: String,
        #[serde(default = "default_reconnect_delay", with = "humantime_serde")]
        reconnect_delay: Duration,
    },
    /// In-process store, for local runs without a backend
    #[default]
    #[serde(rename = "memory")]
    Memory,
}

impl StoreConfig {
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Rest { .. } => "rest",
            StoreConfig::Memory => "memory",
        }
    }
}

/// Where the two path groups live in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_devices_path")]
    pub devices: String,
    #[serde(default = "default_signals_path")]
    pub signals: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            devices: default_devices_path(),
            signals: default_signals_path(),
        }
    }
}

impl PathsConfig {
    pub fn group_path(&self, group: PathGroup) -> &str {
        match group {
            PathGroup::Devices => &self.devices,
            PathGroup::Signals => &self.signals,
        }
    }

    /// Write target of an actuator, e.g. `devices/servo`
    pub fn actuator_path(&self, actuator: Actuator) -> String {
        format!("{}/{}", self.devices.trim_end_matches('/'), actuator.key())
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_reconnect_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_devices_path() -> String {
    "devices".to_string()
}

fn default_signals_path() -> String {
    "signals".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::HomeSyncError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
