//! Cookie service: build, create and expire cookies.
//!
//! The session token travels in an httpOnly cookie named `session`.
//! `Secure` and `SameSite` are left to whoever terminates TLS.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::Duration;

/// Cookie name for the session token.
pub const SESSION_COOKIE: &str = "session";

/// Build the httpOnly cookie carrying a session token.
pub fn session_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .path("/".to_string())
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build an expired session cookie (negative `Max-Age`).
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE.to_string(), String::new()))
        .http_only(true)
        .path("/".to_string())
        .max_age(Duration::seconds(-1))
        .build()
}

/// Session token the request carried, if any.
pub fn session_value(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Set a plain cookie unless the request already carried one by that name.
///
/// Returns the jar and whether the cookie was added.
pub fn create_cookie(jar: CookieJar, name: &str, value: &str) -> (CookieJar, bool) {
    if jar.get(name).is_some() {
        return (jar, false);
    }
    let cookie = Cookie::build((name.to_string(), value.to_string()))
        .path("/".to_string())
        .build();
    (jar.add(cookie), true)
}

/// Expire a cookie the request carried.
///
/// Returns the jar and the cookie as it was received, or `None` if the
/// request had no such cookie.
pub fn delete_cookie(jar: CookieJar, name: &str) -> (CookieJar, Option<Cookie<'static>>) {
    let Some(received) = jar.get(name).cloned() else {
        return (jar, None);
    };
    let expired = Cookie::build((name.to_string(), String::new()))
        .path("/".to_string())
        .max_age(Duration::seconds(-1))
        .build();
    (jar.add(expired), Some(received))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

    use super::*;

    fn jar_with(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc", 1800);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(1800)));
        assert_eq!(cookie.secure(), None);
        assert_eq!(cookie.same_site(), None);
    }

    #[test]
    fn clear_cookie_has_negative_max_age() {
        let cookie = clear_session_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().is_some_and(|age| age.is_negative()));
    }

    #[test]
    fn session_value_reads_request_cookie() {
        assert_eq!(session_value(&jar_with("session=tok; other=1")), Some("tok".into()));
        assert_eq!(session_value(&jar_with("other=1")), None);
        assert_eq!(session_value(&jar_with("session=")), None);
    }

    #[test]
    fn create_cookie_only_when_absent() {
        let (jar, added) = create_cookie(CookieJar::new(), "theme", "dark");
        assert!(added);
        assert_eq!(jar.get("theme").map(|c| c.value()), Some("dark"));

        let (_, added) = create_cookie(jar_with("theme=light"), "theme", "dark");
        assert!(!added);
    }

    #[test]
    fn delete_cookie_expires_received_cookie() {
        let (jar, received) = delete_cookie(jar_with("theme=light"), "theme");
        assert_eq!(received.map(|c| c.value().to_string()), Some("light".into()));
        let expired = jar.get("theme").unwrap();
        assert!(expired.max_age().is_some_and(|age| age.is_negative()));

        let (_, received) = delete_cookie(CookieJar::new(), "theme");
        assert!(received.is_none());
    }
}
