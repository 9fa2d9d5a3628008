//! In-memory session tracking.
//!
//! Two tables live behind one mutex: session token → [`Session`] and
//! username → user entry. Every operation takes the lock once and updates
//! both tables before releasing it, so no caller can observe a session whose
//! user is missing.
//!
//! [`Session`]: crate::models::Session

mod store;
mod sweeper;

pub use store::{SessionStart, SessionStore};
