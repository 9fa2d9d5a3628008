//! Session service: start and stop sessions through the `session` cookie.

use axum_extra::extract::cookie::CookieJar;
use gatehouse_core::{SessionStore, SessionToken, UserRecord};

use super::cookies::{clear_session_cookie, session_cookie, session_value};

/// Log `user` in for the client that sent `jar`.
///
/// Reuses the client's session when its cookie is still bound; otherwise a
/// fresh token is minted and a new cookie added to the returned jar.
pub fn start_session(
    store: &SessionStore,
    jar: CookieJar,
    user: UserRecord,
) -> (CookieJar, SessionToken) {
    let existing = session_value(&jar);
    let start = store.start_session(existing.as_deref(), user);
    let jar = if start.created {
        jar.add(session_cookie(
            &start.token.to_string(),
            store.config().session_timeout_secs(),
        ))
    } else {
        jar
    };
    (jar, start.token)
}

/// Log the client out: drop its session and expire the cookie.
///
/// A request without a session cookie is left untouched.
pub fn stop_session(store: &SessionStore, jar: CookieJar) -> CookieJar {
    match session_value(&jar) {
        Some(token) => {
            store.stop_session(&token);
            jar.add(clear_session_cookie())
        }
        None => jar,
    }
}

/// User bound to the client's session cookie.
pub fn current_user(store: &SessionStore, jar: &CookieJar) -> Option<UserRecord> {
    session_value(jar).and_then(|token| store.validate(&token))
}

pub fn is_logged_in(store: &SessionStore, jar: &CookieJar) -> bool {
    current_user(store, jar).is_some()
}

#[cfg(test)]
mod tests {
    use axum::http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
    };
    use axum::response::IntoResponse;
    use gatehouse_core::roles::ROLE_MEMBER;
    use gatehouse_core::{RoleSet, SessionConfig};

    use super::*;
    use crate::services::cookies::SESSION_COOKIE;

    fn jar_with_session(token: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    fn set_cookies(jar: CookieJar) -> Vec<String> {
        jar.into_response()
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect()
    }

    fn alice() -> UserRecord {
        UserRecord::new("alice", RoleSet::from_iter([ROLE_MEMBER]))
    }

    #[test]
    fn start_sets_cookie_for_new_client() {
        let store = SessionStore::new(SessionConfig::default());
        let (jar, token) = start_session(&store, CookieJar::new(), alice());
        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.value(), token.to_string());
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(1800)));
        assert!(store.is_logged_in(&token.to_string()));
    }

    #[test]
    fn start_reuses_live_cookie() {
        let store = SessionStore::new(SessionConfig::default());
        let (_, token) = start_session(&store, CookieJar::new(), alice());
        let (jar, again) = start_session(&store, jar_with_session(&token.to_string()), alice());
        assert_eq!(again, token);
        assert!(set_cookies(jar).is_empty());
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn start_replaces_malformed_cookie() {
        let store = SessionStore::new(SessionConfig::default());
        let (jar, token) = start_session(&store, jar_with_session("forged"), alice());
        assert_eq!(
            jar.get(SESSION_COOKIE).map(|c| c.value().to_string()),
            Some(token.to_string())
        );
    }

    #[test]
    fn stop_expires_cookie_and_session() {
        let store = SessionStore::new(SessionConfig::default());
        let (_, token) = start_session(&store, CookieJar::new(), alice());
        let jar = stop_session(&store, jar_with_session(&token.to_string()));
        let cleared = jar.get(SESSION_COOKIE).unwrap();
        assert!(cleared.max_age().is_some_and(|age| age.is_negative()));
        assert!(!store.is_logged_in(&token.to_string()));
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn stop_without_cookie_is_noop() {
        let store = SessionStore::new(SessionConfig::default());
        let jar = stop_session(&store, CookieJar::new());
        assert!(set_cookies(jar).is_empty());
    }

    #[test]
    fn current_user_follows_cookie() {
        let store = SessionStore::new(SessionConfig::default());
        let (_, token) = start_session(&store, CookieJar::new(), alice());
        let jar = jar_with_session(&token.to_string());
        assert_eq!(current_user(&store, &jar), Some(alice()));
        assert!(is_logged_in(&store, &jar));
        assert!(!is_logged_in(&store, &CookieJar::new()));
    }
}
