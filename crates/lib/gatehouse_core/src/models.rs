//! Session domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::RoleSet;
use crate::token::SessionToken;

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub roles: RoleSet,
    /// Application payload; never interpreted here.
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, roles: RoleSet) -> Self {
        Self {
            username: username.into(),
            roles,
            attributes: serde_json::Value::Null,
        }
    }

    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// One logged-in client context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    /// Key into the user table, not an owned record.
    pub username: String,
    pub last_activity: DateTime<Utc>,
}
