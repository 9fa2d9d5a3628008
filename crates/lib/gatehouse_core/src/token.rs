//! Session tokens.
//!
//! A token is a random (v4) UUID. Its unguessability is the only thing that
//! keeps a client from adopting someone else's session; it is not signed.

use std::fmt;

use uuid::Uuid;

/// Length of the hyphenated UUID form, the only accepted wire form.
const HYPHENATED_LEN: usize = 36;

/// Opaque identifier of a live session, carried by the client in a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Mint a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a client-supplied value.
    ///
    /// Anything other than a hyphenated UUID yields `None`; callers treat a
    /// malformed token exactly like a missing one.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != HYPHENATED_LEN {
            return None;
        }
        Uuid::try_parse(raw).ok().map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_v4_and_distinct() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version(), Some(uuid::Version::Random));
    }

    #[test]
    fn display_parses_back() {
        let token = SessionToken::generate();
        let wire = token.to_string();
        assert_eq!(wire.len(), 36);
        assert_eq!(SessionToken::parse(&wire), Some(token));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_eq!(SessionToken::parse(""), None);
        assert_eq!(SessionToken::parse("not-a-token"), None);
        assert_eq!(SessionToken::parse("zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz"), None);
        // Simple (unhyphenated) form is valid UUID syntax but not our wire form.
        let simple = SessionToken::generate().as_uuid().simple().to_string();
        assert_eq!(SessionToken::parse(&simple), None);
    }
}
