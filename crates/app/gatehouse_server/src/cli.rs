//! Command-line arguments.

use clap::Parser;
use gatehouse_api::config::ApiConfig;
use gatehouse_core::config::{CONTROL_INTERVAL_ENV, MAX_SECS, SESSION_TIMEOUT_ENV};
use gatehouse_core::{RoleSet, UserRecord};

/// CLI arguments for the demo server.
///
/// Unset options fall back to the environment (see `ApiConfig::from_env`).
/// Timing flags are bounded by [`MAX_SECS`], same as their variables.
#[derive(Parser, Debug)]
#[command(name = "gatehouse_server", about = "Gatehouse session demo server")]
pub struct Args {
    /// Port to listen on on 127.0.0.1 (overrides `BIND_ADDR`).
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds of inactivity after which a session is evicted.
    #[arg(
        long,
        env = SESSION_TIMEOUT_ENV,
        value_parser = clap::value_parser!(i64).range(1..=MAX_SECS)
    )]
    pub session_timeout: Option<i64>,

    /// Minimum seconds between two sweeps.
    #[arg(
        long,
        env = CONTROL_INTERVAL_ENV,
        value_parser = clap::value_parser!(i64).range(1..=MAX_SECS)
    )]
    pub control_interval: Option<i64>,

    /// Also sweep from a background task, not only on incoming requests.
    #[arg(long, default_value_t = false)]
    pub background_sweep: bool,

    /// Known user as `name:ROLE_A,ROLE_B`. Repeatable.
    #[arg(
        long = "user",
        value_parser = parse_user,
        default_values = ["admin:ROLE_ADMIN", "member:ROLE_MEMBER"]
    )]
    pub users: Vec<UserRecord>,
}

impl Args {
    /// Layer explicit flags over the environment-derived config.
    pub fn apply(&self, config: &mut ApiConfig) {
        if let Some(port) = self.port {
            config.bind_addr = format!("127.0.0.1:{port}");
        }
        if let Some(secs) = self.session_timeout {
            config.session = config
                .session
                .with_session_timeout(chrono::Duration::seconds(secs));
        }
        if let Some(secs) = self.control_interval {
            config.session = config
                .session
                .with_control_interval(chrono::Duration::seconds(secs));
        }
    }
}

fn parse_user(raw: &str) -> Result<UserRecord, String> {
    let (name, roles) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected name:ROLES, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("user name is empty".into());
    }
    let roles = RoleSet::parse(roles);
    if roles.is_empty() {
        return Err(format!("user {name} has no roles"));
    }
    Ok(UserRecord::new(name, roles))
}
