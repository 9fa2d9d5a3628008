//! Session services shared by handlers and the dispatcher.

pub mod cookies;
pub mod session;
