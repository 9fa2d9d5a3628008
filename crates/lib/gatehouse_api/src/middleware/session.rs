//! Session middleware: the dispatcher's role gate as axum layers.
//!
//! For applications that build their own `Router` instead of handing every
//! path to an [`AuthDispatcher`](crate::AuthDispatcher).

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use gatehouse_core::{RoleSet, SessionStore};

use crate::dispatcher::{AuthRule, CurrentUser};
use crate::error::ApiError;
use crate::services::cookies::session_value;

/// State for [`require_roles`].
#[derive(Clone)]
pub struct RoleGuard {
    pub store: Arc<SessionStore>,
    pub rule: Arc<AuthRule>,
}

impl RoleGuard {
    pub fn new(store: Arc<SessionStore>, path: impl Into<String>, required_roles: RoleSet) -> Self {
        Self {
            store,
            rule: Arc::new(AuthRule {
                path: path.into(),
                required_roles,
            }),
        }
    }
}

/// Axum middleware: resolves the `session` cookie, checks the rule's roles,
/// and injects [`CurrentUser`] into request extensions.
///
/// No valid session yields 401; a user without a required role yields 403.
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session_value(&jar)
        .and_then(|token| guard.store.validate(&token))
        .ok_or_else(|| ApiError::Unauthorized("No valid session".into()))?;

    if !guard.rule.permits(&user) {
        return Err(ApiError::Forbidden(format!(
            "{} requires one of: {}",
            guard.rule.path, guard.rule.required_roles
        )));
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Axum middleware: runs the store's rate-limited sweep before each request.
pub async fn sweep_sessions(
    State(store): State<Arc<SessionStore>>,
    request: Request,
    next: Next,
) -> Response {
    store.sweep_now();
    next.run(request).await
}
