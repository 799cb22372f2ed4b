//! Configuration file.
//!
//! Loaded from `<config dir>/bikenav/config.toml`. Every section is
//! optional; a missing file yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub reroute: RerouteConfig,
    #[serde(default)]
    pub recents: RecentsConfig,
}

/// Routing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Request timeout in seconds (default: 15).
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Request alternatives on fresh searches (default: true).
    #[serde(default = "default_true")]
    pub alternatives: bool,
}

/// Live rerouting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerouteConfig {
    /// Minimum seconds between the end of one reroute and the next (default: 0).
    #[serde(default)]
    pub cooldown_seconds: u64,
    #[serde(default = "default_search_radius_m")]
    pub search_radius_m: f64,
    #[serde(default = "default_bearing_range_deg")]
    pub bearing_range_deg: u16,
    /// Distance from the route at which the rider counts as off route.
    #[serde(default = "default_off_route_threshold_m")]
    pub off_route_threshold_m: f64,
}

/// Recent destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentsConfig {
    #[serde(default = "default_recents_capacity")]
    pub capacity: usize,
    /// Overrides `<data dir>/bikenav/recents.json`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://routing.openstreetmap.de/routed-bike".to_string()
}

fn default_profile() -> String {
    "cycling".to_string()
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_search_radius_m() -> f64 {
    20.0
}

fn default_bearing_range_deg() -> u16 {
    45
}

fn default_off_route_threshold_m() -> f64 {
    crate::reroute::DEFAULT_OFF_ROUTE_THRESHOLD_M
}

fn default_recents_capacity() -> usize {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            profile: default_profile(),
            timeout_seconds: default_timeout_seconds(),
            alternatives: true,
        }
    }
}

impl Default for RerouteConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 0,
            search_radius_m: default_search_radius_m(),
            bearing_range_deg: default_bearing_range_deg(),
            off_route_threshold_m: default_off_route_threshold_m(),
        }
    }
}

impl Default for RecentsConfig {
    fn default() -> Self {
        Self {
            capacity: default_recents_capacity(),
            path: None,
        }
    }
}

impl RerouteConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

impl RecentsConfig {
    /// Where recents are persisted.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            data_dir.join("bikenav").join("recents.json")
        })
    }
}

impl NavConfig {
    /// Returns the path to the configuration file.
    ///
    /// Falls back to the current directory if the platform has no config dir.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("bikenav").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `NavConfig::default()`.
    /// - Otherwise parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(NavConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: NavConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.backend.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                message: format!("backend.base_url must be an http(s) URL, got '{base_url}'"),
            });
        }

        if self.backend.profile.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "backend.profile must not be empty".to_string(),
            });
        }

        if self.backend.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "backend.timeout_seconds must be positive".to_string(),
            });
        }

        if self.reroute.bearing_range_deg > 180 {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "reroute.bearing_range_deg must be within 0..=180, got {}",
                    self.reroute.bearing_range_deg
                ),
            });
        }

        if self.recents.capacity == 0 {
            return Err(ConfigError::ValidationError {
                message: "recents.capacity must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
