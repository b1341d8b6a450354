//! Daemon configuration parsing.
//!
//! Configuration is a small TOML file; every key has a default so an
//! absent file (or an empty one) yields a runnable server. CLI flags
//! in the daemon binary override individual fields after loading.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default listen address, matching the reference deployment.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5555;

/// Default maximum concurrent connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Default timeout for an ordinary protocol read, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Default timeout while waiting for a recharge to complete. Five
/// times the ordinary read timeout.
pub const DEFAULT_RECHARGE_TIMEOUT_MS: u64 = 5000;

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoverConfig {
    /// Address the TCP listener binds to.
    pub bind_addr: String,

    /// Port the TCP listener binds to.
    pub port: u16,

    /// Maximum concurrent client connections.
    pub max_connections: usize,

    /// Timeout for an ordinary protocol read, in milliseconds.
    pub read_timeout_ms: u64,

    /// Timeout while waiting for a recharge to complete, in
    /// milliseconds.
    pub recharge_timeout_ms: u64,
}

impl Default for RoverConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            recharge_timeout_ms: DEFAULT_RECHARGE_TIMEOUT_MS,
        }
    }
}

impl RoverConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid, contains unknown keys,
    /// or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero timeout or a zero
    /// connection limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::invalid("read_timeout_ms must be non-zero"));
        }
        if self.recharge_timeout_ms == 0 {
            return Err(ConfigError::invalid("recharge_timeout_ms must be non-zero"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::invalid("max_connections must be non-zero"));
        }
        Ok(())
    }

    /// Ordinary protocol read timeout.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Recharge-wait timeout.
    #[must_use]
    pub const fn recharge_timeout(&self) -> Duration {
        Duration::from_millis(self.recharge_timeout_ms)
    }

    /// `addr:port` string for the TCP listener.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[source] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    /// A field failed validation.
    #[error("invalid config: {reason}")]
    Invalid {
        /// Description of the constraint violation.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}
