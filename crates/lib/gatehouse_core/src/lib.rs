//! # gatehouse_core
//!
//! Session store and role model for Gatehouse.
//!
//! The [`SessionStore`](session::SessionStore) binds opaque session tokens to
//! user records and evicts sessions that have been idle for longer than the
//! configured timeout. It has no HTTP knowledge; `gatehouse_api` carries the
//! tokens in cookies and gates routes on the roles of the bound user.

pub mod clock;
pub mod config;
pub mod models;
pub mod roles;
pub mod session;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, SessionConfig};
pub use models::{Session, UserRecord};
pub use roles::RoleSet;
pub use session::SessionStore;
pub use token::SessionToken;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
