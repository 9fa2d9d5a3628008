//! Session timing configuration.

use chrono::Duration;
use thiserror::Error;

/// Default inactivity timeout: 30 minutes.
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 30 * 60;

/// Default minimum spacing between two sweeps.
pub const DEFAULT_CONTROL_INTERVAL_SECS: i64 = 45;

/// Largest accepted number of seconds; `chrono::Duration::seconds` panics past it.
pub const MAX_SECS: i64 = i64::MAX / 1_000;

/// Environment variable overriding the session timeout (seconds).
pub const SESSION_TIMEOUT_ENV: &str = "GATEHOUSE_SESSION_TIMEOUT_SECS";

/// Environment variable overriding the sweep control interval (seconds).
pub const CONTROL_INTERVAL_ENV: &str = "GATEHOUSE_CONTROL_INTERVAL_SECS";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a whole number of seconds: {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} must be positive, got {value}")]
    NotPositive { var: &'static str, value: i64 },

    #[error("{var} must be at most {MAX_SECS} seconds, got {value}")]
    OutOfRange { var: &'static str, value: i64 },
}

/// Timing knobs for a [`SessionStore`](crate::SessionStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// A session idle for longer than this is evicted by the next sweep.
    pub session_timeout: Duration,
    /// A sweep only scans when more than this has passed since the last scan.
    pub control_interval: Duration,
}

impl SessionConfig {
    /// Reads configuration from environment variables with defaults.
    ///
    /// | Variable                            | Default |
    /// |-------------------------------------|---------|
    /// | `GATEHOUSE_SESSION_TIMEOUT_SECS`    | `1800`  |
    /// | `GATEHOUSE_CONTROL_INTERVAL_SECS`   | `45`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_timeout = read_secs(&lookup, SESSION_TIMEOUT_ENV)?
            .unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS);
        let control_interval = read_secs(&lookup, CONTROL_INTERVAL_ENV)?
            .unwrap_or(DEFAULT_CONTROL_INTERVAL_SECS);
        Ok(Self {
            session_timeout: Duration::seconds(session_timeout),
            control_interval: Duration::seconds(control_interval),
        })
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_control_interval(mut self, interval: Duration) -> Self {
        self.control_interval = interval;
        self
    }

    /// Session timeout in whole seconds, as used for the cookie `Max-Age`.
    pub fn session_timeout_secs(&self) -> i64 {
        self.session_timeout.num_seconds()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::seconds(DEFAULT_SESSION_TIMEOUT_SECS),
            control_interval: Duration::seconds(DEFAULT_CONTROL_INTERVAL_SECS),
        }
    }
}

fn read_secs<F>(lookup: &F, var: &'static str) -> Result<Option<i64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: i64 = raw.parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: raw.to_string(),
    })?;
    if value <= 0 {
        return Err(ConfigError::NotPositive { var, value });
    }
    if value > MAX_SECS {
        return Err(ConfigError::OutOfRange { var, value });
    }
    Ok(Some(value))
}
