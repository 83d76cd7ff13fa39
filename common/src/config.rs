// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::{IngestConfig, DEFAULT_ENDPOINT, DEFAULT_LIVENESS_WINDOW};

/// Path of a JSON config file, overrides the platform config directory.
pub const CONFIG_PATH_VAR: &str = "HUMIDITY_MONITOR_CONFIG";
pub const ENDPOINT_VAR: &str = "HUMIDITY_MONITOR_URL";
pub const STALL_SECS_VAR: &str = "HUMIDITY_MONITOR_STALL_SECS";
pub const SIMULATE_VAR: &str = "HUMIDITY_MONITOR_SIMULATE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Settings of the monitor, read from an optional JSON file and the
/// environment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// WebSocket URL of the sensor stream.
    pub endpoint: String,
    /// Seconds without a decoded frame before the stream counts as stalled.
    pub stall_after_secs: u64,
    /// Replay bundled frames instead of connecting.
    pub simulate: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            stall_after_secs: DEFAULT_LIVENESS_WINDOW.as_secs(),
            simulate: false,
        }
    }
}

impl MonitorConfig {
    /// Defaults, then the config file if there is one, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_file() {
            Some(path) => {
                log::info!("Reading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json_data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&json_data)
    }

    pub fn from_json(json_data: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str::<Self>(json_data)?;
        config.validate()?;

        Ok(config)
    }

    /// Applies the `HUMIDITY_MONITOR_*` variables found through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(endpoint) = lookup(ENDPOINT_VAR) {
            self.endpoint = endpoint;
        }

        if let Some(value) = lookup(STALL_SECS_VAR) {
            self.stall_after_secs = value
                .trim()
                .parse()
                .map_err(|_| invalid(STALL_SECS_VAR, &value))?;
        }

        if let Some(value) = lookup(SIMULATE_VAR) {
            self.simulate = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => return Err(invalid(SIMULATE_VAR, &value)),
            };
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stall_after_secs == 0 {
            return Err(invalid("stall_after_secs", "0"));
        }
        if self.endpoint.trim().is_empty() && !self.simulate {
            return Err(invalid("endpoint", &self.endpoint));
        }

        Ok(())
    }

    pub fn ingest(&self) -> IngestConfig {
        IngestConfig {
            endpoint: self.endpoint.clone(),
            liveness_window: Duration::from_secs(self.stall_after_secs),
        }
    }

    fn config_file() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_VAR) {
            return Some(path.into());
        }

        let path = directories::ProjectDirs::from("", "", "humidity-monitor")?
            .config_dir()
            .join("config.json");

        path.is_file().then_some(path)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_the_reference_source() {
        let config = MonitorConfig::default();

        assert_eq!(config.endpoint, "wss://servidor-1hnh.onrender.com");
        assert_eq!(config.ingest().liveness_window, Duration::from_secs(10));
        assert!(!config.simulate);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MonitorConfig::from_json(r#"{ "endpoint": "ws://127.0.0.1:8080" }"#).unwrap();

        assert_eq!(config.endpoint, "ws://127.0.0.1:8080");
        assert_eq!(config.stall_after_secs, 10);
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = MonitorConfig::from_json(r#"{ "stall_after_secs": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "stall_after_secs"));
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = MonitorConfig::default();

        config
            .apply_overrides(lookup(&[
                (ENDPOINT_VAR, "ws://sensor.local:81"),
                (STALL_SECS_VAR, " 30 "),
                (SIMULATE_VAR, "yes"),
            ]))
            .unwrap();

        assert_eq!(
            config,
            MonitorConfig {
                endpoint: "ws://sensor.local:81".into(),
                stall_after_secs: 30,
                simulate: true,
            }
        );
    }

    #[test]
    fn test_invalid_environment_values() {
        let mut config = MonitorConfig::default();

        assert!(config
            .apply_overrides(lookup(&[(STALL_SECS_VAR, "ten")]))
            .is_err());
        assert!(config
            .apply_overrides(lookup(&[(SIMULATE_VAR, "maybe")]))
            .is_err());
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = MonitorConfig::from_file(Path::new("/nonexistent/humidity.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
