//! Client configuration
//!
//! Loaded from a TOML file, then overlaid with `DOCKENV_*` environment
//! variables:
//!
//! ```toml
//! docker_host = "unix:///var/run/docker.sock"
//! timeout_secs = 120
//! docker_binary = "docker"
//! strip_mode = "char-class"
//! stop_timeout_secs = 10
//! ```

use dockenv_archive::StripMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Daemon address; local defaults when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_host: Option<String>,

    /// Request timeout handed to the runtime client
    pub timeout_secs: u64,

    /// CLI used to build exec commands
    pub docker_binary: String,

    /// Entry name rewrite used by path extraction
    pub strip_mode: StripMode,

    /// Grace period before a stopped container is killed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_timeout_secs: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            docker_host: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            docker_binary: "docker".to_string(),
            strip_mode: StripMode::default(),
            stop_timeout_secs: None,
        }
    }
}

impl Config {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub const ENV_DOCKER_HOST: &'static str = "DOCKENV_DOCKER_HOST";
    pub const ENV_DOCKER_BINARY: &'static str = "DOCKENV_DOCKER_BINARY";
    pub const ENV_STRIP_MODE: &'static str = "DOCKENV_STRIP_MODE";

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Overlay `DOCKENV_*` variables from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Overlay variables from `lookup`.
    pub fn with_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(Self::ENV_DOCKER_HOST) {
            self.docker_host = Some(host);
        }
        if let Some(binary) = lookup(Self::ENV_DOCKER_BINARY) {
            self.docker_binary = binary;
        }
        if let Some(mode) = lookup(Self::ENV_STRIP_MODE) {
            self.strip_mode = mode.parse().map_err(|reason| ConfigError::Invalid {
                key: Self::ENV_STRIP_MODE,
                reason,
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.docker_binary.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "docker_binary",
                reason: "cannot be empty".to_string(),
            });
        }
        if matches!(self.docker_host.as_deref(), Some(h) if h.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                key: "docker_host",
                reason: "cannot be empty".to_string(),
            });
        }
        if matches!(self.stop_timeout_secs, Some(t) if t < 0) {
            return Err(ConfigError::Invalid {
                key: "stop_timeout_secs",
                reason: "cannot be negative".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
