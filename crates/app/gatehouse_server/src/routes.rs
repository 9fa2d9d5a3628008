//! Demo routes.
//!
//! Login takes a username from a fixed directory and checks no password;
//! credential verification belongs to the embedding application.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, Request};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use gatehouse_api::dispatcher::{default_forbidden, default_not_found};
use gatehouse_api::services::session;
use gatehouse_api::{
    ApiError, AuthDispatcher, AuthDispatcherBuilder, CurrentUser, PAGE_NOT_FOUND, PAGE_PROTECTED,
    RouteHandler,
};
use gatehouse_core::roles::{ROLE_ADMIN, ROLE_MEMBER};
use gatehouse_core::{RoleSet, SessionStore, UserRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Users who may log in, by name.
pub type Directory = HashMap<String, UserRecord>;

#[derive(Debug, Deserialize)]
struct LoginParams {
    username: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LoginResponse {
    username: String,
    roles: RoleSet,
}

/// Register the demo routes on a dispatcher builder.
pub fn dispatcher(store: Arc<SessionStore>, directory: Directory) -> AuthDispatcherBuilder {
    let directory = Arc::new(directory);
    AuthDispatcher::builder(store.clone())
        .register_open_route("/", |_request: Request| async {
            "gatehouse: GET /login?username=NAME, /members, /admin, /logout".into_response()
        })
        .register_open_route("/login", login(store.clone(), directory))
        .register_open_route("/logout", logout(store))
        .register_guarded_route(
            "/members",
            whoami,
            RoleSet::from_iter([ROLE_MEMBER, ROLE_ADMIN]),
        )
        .register_guarded_route("/admin", whoami, RoleSet::from_iter([ROLE_ADMIN]))
        .register_open_route(PAGE_NOT_FOUND, default_not_found())
        .register_open_route(PAGE_PROTECTED, default_forbidden())
}

fn login(store: Arc<SessionStore>, directory: Arc<Directory>) -> impl RouteHandler {
    move |request: Request| {
        let store = store.clone();
        let directory = directory.clone();
        async move {
            let params = match Query::<LoginParams>::try_from_uri(request.uri()) {
                Ok(Query(params)) => params,
                Err(e) => return ApiError::Validation(e.to_string()).into_response(),
            };
            let Some(user) = directory.get(&params.username).cloned() else {
                return ApiError::Validation(format!("unknown user {}", params.username))
                    .into_response();
            };

            let mut jar = CookieJar::from_headers(request.headers());
            // A live session keeps its binding, so switching users needs a logout.
            if let Some(current) = session::current_user(&store, &jar)
                && current.username != user.username
            {
                info!(from = %current.username, to = %user.username, "switching user");
                jar = session::stop_session(&store, jar);
            }

            let (jar, token) = session::start_session(&store, jar, user);
            let Some(bound) = store.validate(&token.to_string()) else {
                return ApiError::Internal("session vanished after login".into()).into_response();
            };
            info!(username = %bound.username, "logged in");
            let body = LoginResponse {
                username: bound.username,
                roles: bound.roles,
            };
            (jar, Json(body)).into_response()
        }
    }
}

fn logout(store: Arc<SessionStore>) -> impl RouteHandler {
    move |request: Request| {
        let store = store.clone();
        async move {
            let jar = CookieJar::from_headers(request.headers());
            if let Some(user) = session::current_user(&store, &jar) {
                info!(username = %user.username, "logged out");
            }
            (session::stop_session(&store, jar), "logged out").into_response()
        }
    }
}

async fn whoami(request: Request) -> Response {
    match request.extensions().get::<CurrentUser>() {
        Some(CurrentUser(user)) => Json(user.clone()).into_response(),
        None => ApiError::Internal("guarded route without user".into()).into_response(),
    }
}
