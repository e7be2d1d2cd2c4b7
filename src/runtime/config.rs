//! Receiver and dispatcher configuration.

use crate::replay::DEFAULT_MAX_BODY_SIZE;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("dispatch timeout must be greater than zero")]
    ZeroDispatchTimeout,

    #[error("max body size must be greater than zero")]
    ZeroMaxBodySize,
}

/// Configuration for the replay receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Timeout for one outbound replay, in seconds.
    pub dispatch_timeout_secs: u64,
    /// How long idle pooled connections are kept, in seconds.
    pub pool_idle_timeout_secs: u64,
    /// Maximum size in bytes of a received event and of a replayed body.
    pub max_body_size: usize,
    /// Whether to serve `/_health`.
    pub enable_health: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            dispatch_timeout_secs: 30,
            pool_idle_timeout_secs: 90,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            enable_health: true,
        }
    }
}

impl ReplayConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = lookup("REPLAY_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(secs) = parse_var(&lookup, "REPLAY_DISPATCH_TIMEOUT_SECS")? {
            config.dispatch_timeout_secs = secs;
        }
        if let Some(secs) = parse_var(&lookup, "REPLAY_POOL_IDLE_TIMEOUT_SECS")? {
            config.pool_idle_timeout_secs = secs;
        }
        if let Some(size) = parse_var(&lookup, "REPLAY_MAX_BODY_SIZE")? {
            config.max_body_size = size;
        }
        if let Some(enabled) = parse_var(&lookup, "REPLAY_ENABLE_HEALTH")? {
            config.enable_health = enabled;
        }
        Ok(config)
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the outbound timeout.
    pub fn dispatch_timeout_secs(mut self, secs: u64) -> Self {
        self.dispatch_timeout_secs = secs;
        self
    }

    /// Set the body size limit.
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch_timeout_secs == 0 {
            return Err(ConfigError::ZeroDispatchTimeout);
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::ZeroMaxBodySize);
        }
        Ok(())
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
