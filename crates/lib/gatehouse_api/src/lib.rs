//! # gatehouse_api
//!
//! axum integration for Gatehouse.
//!
//! Session tokens travel in the `session` cookie. [`AuthDispatcher`] routes
//! each request by path and gates registered paths on the roles of the user
//! bound to that cookie; the helpers in [`services`] start and stop sessions
//! from application handlers.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod services;

pub use dispatcher::{
    AuthDispatcher, AuthDispatcherBuilder, AuthRule, CurrentUser, Decision, DispatcherError,
    PAGE_NOT_FOUND, PAGE_PROTECTED, RouteHandler,
};
pub use error::ApiError;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
