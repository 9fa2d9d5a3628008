//! Role labels and role sets.
//!
//! Roles cross the API boundary as a `", "`-delimited string such as
//! `"ROLE_ADMIN, ROLE_MEMBER"`. Internally they are a set of discrete labels
//! and membership is an exact match, so `ROLE_ADMIN2` never satisfies a
//! requirement of `ROLE_ADMIN`.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_MANAGER: &str = "ROLE_MANAGER";
pub const ROLE_MEMBER: &str = "ROLE_MEMBER";

/// Separator used when rendering a role set as a string.
pub const ROLE_SEPARATOR: &str = ", ";

/// An unordered set of role labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize a delimited role string.
    ///
    /// Labels are split on `,`, trimmed, and empty labels are dropped.
    pub fn parse(roles: &str) -> Self {
        roles
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .collect()
    }

    pub fn insert(&mut self, role: impl Into<String>) -> bool {
        self.0.insert(role.into())
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// True if at least one label is in both sets.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        let (small, large) = if self.0.len() <= other.0.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.0.iter().any(|role| large.0.contains(role))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl FromStr for RoleSet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for RoleSet {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<RoleSet> for String {
    fn from(roles: RoleSet) -> Self {
        roles.to_string()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for role in &self.0 {
            if !first {
                f.write_str(ROLE_SEPARATOR)?;
            }
            f.write_str(role)?;
            first = false;
        }
        Ok(())
    }
}
