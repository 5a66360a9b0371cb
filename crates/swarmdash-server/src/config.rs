//! Configuration loading for the relay binary.
//!
//! The canonical configuration lives in `swarmdash-config.yaml` at the
//! process working directory. Each subsystem defines its own typed
//! config struct; this module composes them into one document and
//! provides the loader. Every field has a default, so an absent file
//! or an empty document yields a runnable configuration (pointed at a
//! local `InfluxDB`).

use std::path::Path;

use serde::Deserialize;

use swarmdash_core::RefreshConfig;
use swarmdash_influx::{CollectorConfig, InfluxConfig};
use swarmdash_observer::ServerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level relay configuration.
///
/// Mirrors the structure of `swarmdash-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Metrics store connection settings.
    #[serde(default)]
    pub influx: InfluxConfig,

    /// Document assembly options.
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Refresh loop cadence and persist aid.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Observer server bind address.
    #[serde(default)]
    pub server: ServerConfig,
}

impl RelayConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the store
    /// connection: `INFLUXDB_URL` overrides `influx.url` and
    /// `INFLUXDB_TOKEN` overrides `influx.token`, so the token can
    /// stay out of the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.influx.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.influx.apply_env_overrides();
        Ok(config)
    }
}
