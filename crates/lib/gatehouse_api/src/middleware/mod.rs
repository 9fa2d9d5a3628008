//! Request middleware for ordinary axum routers.

pub mod session;
