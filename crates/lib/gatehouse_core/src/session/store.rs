use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::models::{Session, UserRecord};
use crate::token::SessionToken;

/// Result of [`SessionStore::start_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStart {
    pub token: SessionToken,
    /// `true` if a new token was minted and must be handed to the client.
    pub created: bool,
}

/// The latest record for a username plus every live session bound to it.
#[derive(Debug)]
struct UserEntry {
    record: UserRecord,
    sessions: HashSet<SessionToken>,
}

#[derive(Debug)]
struct Tables {
    sessions: HashMap<SessionToken, Session>,
    users: HashMap<String, UserEntry>,
    last_sweep: DateTime<Utc>,
}

impl Tables {
    /// Both directions of the binding agree for `token`.
    fn is_consistent(&self, token: &SessionToken) -> bool {
        self.sessions.get(token).is_some_and(|session| {
            self.users
                .get(&session.username)
                .is_some_and(|entry| entry.sessions.contains(token))
        })
    }

    fn bind(&mut self, token: SessionToken, user: UserRecord, now: DateTime<Utc>) {
        let username = user.username.clone();
        match self.users.get_mut(&username) {
            Some(entry) => {
                // Last login wins for the shared record.
                entry.record = user;
                entry.sessions.insert(token);
            }
            None => {
                self.users.insert(
                    username.clone(),
                    UserEntry {
                        record: user,
                        sessions: HashSet::from([token]),
                    },
                );
            }
        }
        self.sessions.insert(
            token,
            Session {
                token,
                username,
                last_activity: now,
            },
        );
    }

    /// Remove `token` from both tables. The user entry goes with its last
    /// session.
    fn unlink(&mut self, token: &SessionToken) -> Option<Session> {
        let session = self.sessions.remove(token)?;
        if let Some(entry) = self.users.get_mut(&session.username) {
            entry.sessions.remove(token);
            if entry.sessions.is_empty() {
                self.users.remove(&session.username);
            }
        }
        Some(session)
    }

    fn user_of(&self, token: &SessionToken) -> Option<&UserRecord> {
        let session = self.sessions.get(token)?;
        self.users.get(&session.username).map(|entry| &entry.record)
    }
}

/// Server-side session table.
///
/// Construct one at startup and share it behind an `Arc`; every method takes
/// `&self`. No method fails: absence and malformed tokens come back as
/// `None`/`false`.
pub struct SessionStore {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    tables: Mutex<Tables>,
}

impl SessionStore {
    /// Create a store on the wall clock.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let last_sweep = clock.now();
        Self {
            config,
            clock,
            tables: Mutex::new(Tables {
                sessions: HashMap::new(),
                users: HashMap::new(),
                last_sweep,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Every write completes both tables before returning, so a poisoned
        // guard still holds consistent data.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bind `user` to a session, reusing `existing` when it is still valid.
    ///
    /// A well-formed token that already points at a live user is returned
    /// unchanged (and touched). A token that is missing, malformed, unknown
    /// or dangling is discarded and a fresh one is minted.
    pub fn start_session(&self, existing: Option<&str>, user: UserRecord) -> SessionStart {
        let now = self.clock.now();
        let mut tables = self.lock();

        if let Some(token) = existing.and_then(SessionToken::parse) {
            if tables.is_consistent(&token) {
                if let Some(session) = tables.sessions.get_mut(&token) {
                    session.last_activity = now;
                }
                debug!(username = %user.username, "session already active");
                return SessionStart {
                    token,
                    created: false,
                };
            }
            if tables.sessions.contains_key(&token) {
                warn!(username = %user.username, "purging inconsistent session");
                tables.unlink(&token);
            }
        }

        let token = SessionToken::generate();
        debug!(username = %user.username, "session started");
        tables.bind(token, user, now);
        SessionStart {
            token,
            created: true,
        }
    }

    /// Invalidate a session. Unknown or malformed tokens are ignored.
    ///
    /// Returns whether a session was removed.
    pub fn stop_session(&self, token: &str) -> bool {
        let Some(token) = SessionToken::parse(token) else {
            return false;
        };
        match self.lock().unlink(&token) {
            Some(session) => {
                debug!(username = %session.username, "session stopped");
                true
            }
            None => false,
        }
    }

    /// Look up the user bound to `token` and mark the session active.
    ///
    /// Returns `None` unless both the session and its user exist. Nothing is
    /// repaired here.
    pub fn validate(&self, token: &str) -> Option<UserRecord> {
        self.session(token).map(|(_, user)| user)
    }

    /// Like [`validate`](Self::validate), also returning the parsed token.
    pub fn session(&self, token: &str) -> Option<(SessionToken, UserRecord)> {
        let token = SessionToken::parse(token)?;
        let now = self.clock.now();
        let mut tables = self.lock();
        let user = tables.user_of(&token)?.clone();
        if let Some(session) = tables.sessions.get_mut(&token) {
            session.last_activity = now;
        }
        Some((token, user))
    }

    pub fn is_logged_in(&self, token: &str) -> bool {
        self.validate(token).is_some()
    }

    /// Username a session points at, without touching it.
    pub fn username(&self, token: &str) -> Option<String> {
        let token = SessionToken::parse(token)?;
        self.lock()
            .sessions
            .get(&token)
            .map(|session| session.username.clone())
    }

    /// Last activity of a session, without touching it.
    pub fn last_activity(&self, token: &str) -> Option<DateTime<Utc>> {
        let token = SessionToken::parse(token)?;
        self.lock()
            .sessions
            .get(&token)
            .map(|session| session.last_activity)
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Evict sessions idle for longer than the session timeout.
    ///
    /// Scans at most once per control interval: returns `None` without
    /// scanning if the previous scan was `control_interval` or less before
    /// `now`, otherwise the number of sessions evicted.
    pub fn sweep(&self, now: DateTime<Utc>) -> Option<usize> {
        let mut tables = self.lock();
        if now - tables.last_sweep <= self.config.control_interval {
            return None;
        }
        tables.last_sweep = now;

        let timeout = self.config.session_timeout;
        let expired: Vec<SessionToken> = tables
            .sessions
            .values()
            .filter(|session| now - session.last_activity > timeout)
            .map(|session| session.token)
            .collect();
        for token in &expired {
            tables.unlink(token);
        }

        if !expired.is_empty() {
            info!(
                evicted = expired.len(),
                remaining = tables.sessions.len(),
                "swept idle sessions"
            );
        }
        Some(expired.len())
    }

    /// [`sweep`](Self::sweep) at the store clock's current time.
    pub fn sweep_now(&self) -> Option<usize> {
        self.sweep(self.clock.now())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.lock();
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .field("sessions", &tables.sessions.len())
            .field("users", &tables.users.len())
            .finish()
    }
}
