//! API server configuration.

use gatehouse_core::{ConfigError, SessionConfig};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3100";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Session timing.
    pub session: SessionConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                          | Default          |
    /// |-----------------------------------|------------------|
    /// | `BIND_ADDR`                       | `127.0.0.1:3100` |
    /// | `GATEHOUSE_SESSION_TIMEOUT_SECS`  | `1800`           |
    /// | `GATEHOUSE_CONTROL_INTERVAL_SECS` | `45`             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into()),
            session: SessionConfig::from_env()?,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            session: SessionConfig::default(),
        }
    }
}
