//! Path-based dispatch gated by role requirements.
//!
//! Every request ends in exactly one handler:
//!
//! | Path                                  | Handler                |
//! |---------------------------------------|------------------------|
//! | not registered                        | not-found fallback     |
//! | registered, no rule                   | route handler          |
//! | registered with rule, roles intersect | route handler          |
//! | registered with rule, otherwise       | forbidden fallback     |
//!
//! Routes are registered on an [`AuthDispatcherBuilder`] before traffic
//! starts; the built [`AuthDispatcher`] is immutable and shared.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use gatehouse_core::{RoleSet, SessionStore, UserRecord};
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;
use crate::services::cookies::session_value;

/// Reserved path identifier configuring the not-found fallback.
pub const PAGE_NOT_FOUND: &str = "PAGE_NOT_FOUND";

/// Reserved path identifier configuring the forbidden fallback.
pub const PAGE_PROTECTED: &str = "PAGE_PROTECTED";

/// Something that turns a request into a response.
///
/// Implemented for every `Fn(Request) -> impl Future<Output = Response>`.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: Request) -> Response;
}

#[async_trait]
impl<F, Fut> RouteHandler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    async fn handle(&self, request: Request) -> Response {
        (self)(request).await
    }
}

type BoxedHandler = Arc<dyn RouteHandler>;

/// Access-control policy bound to a path.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthRule {
    pub path: String,
    /// The user needs at least one of these.
    pub required_roles: RoleSet,
}

impl AuthRule {
    pub fn permits(&self, user: &UserRecord) -> bool {
        user.roles.intersects(&self.required_roles)
    }
}

/// The authenticated user of a permitted guarded request, stored in the
/// request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

/// Configuration errors caught by [`AuthDispatcherBuilder::build`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatcherError {
    #[error("no not-found handler configured")]
    MissingNotFound,

    #[error("no forbidden handler configured")]
    MissingForbidden,

    #[error("guarded route {0} requires no roles and could never be reached")]
    EmptyRoleSet(String),
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Run the route handler. Carries the user for guarded routes.
    Permit(Option<UserRecord>),
    Forbidden,
    NotFound,
}

struct Route {
    handler: BoxedHandler,
    rule: Option<AuthRule>,
}

/// Collects routes and fallbacks.
pub struct AuthDispatcherBuilder {
    store: Arc<SessionStore>,
    routes: HashMap<String, Route>,
    not_found: Option<BoxedHandler>,
    forbidden: Option<BoxedHandler>,
}

impl AuthDispatcherBuilder {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            routes: HashMap::new(),
            not_found: None,
            forbidden: None,
        }
    }

    /// Bind `path` to `handler` with no role restriction.
    ///
    /// [`PAGE_NOT_FOUND`] and [`PAGE_PROTECTED`] configure the fallbacks
    /// instead. Registering a path again replaces the previous route.
    pub fn register_open_route<H>(mut self, path: impl Into<String>, handler: H) -> Self
    where
        H: RouteHandler + 'static,
    {
        let path = path.into();
        let handler: BoxedHandler = Arc::new(handler);
        match path.as_str() {
            PAGE_NOT_FOUND => self.not_found = Some(handler),
            PAGE_PROTECTED => self.forbidden = Some(handler),
            _ => {
                self.routes.insert(
                    path,
                    Route {
                        handler,
                        rule: None,
                    },
                );
            }
        }
        self
    }

    /// Bind `path` to `handler`, reachable only by users holding one of
    /// `required_roles`.
    pub fn register_guarded_route<H>(
        mut self,
        path: impl Into<String>,
        handler: H,
        required_roles: RoleSet,
    ) -> Self
    where
        H: RouteHandler + 'static,
    {
        let path = path.into();
        let rule = AuthRule {
            path: path.clone(),
            required_roles,
        };
        self.routes.insert(
            path,
            Route {
                handler: Arc::new(handler),
                rule: Some(rule),
            },
        );
        self
    }

    pub fn set_not_found<H: RouteHandler + 'static>(mut self, handler: H) -> Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    pub fn set_forbidden<H: RouteHandler + 'static>(mut self, handler: H) -> Self {
        self.forbidden = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<AuthDispatcher, DispatcherError> {
        let not_found = self.not_found.ok_or(DispatcherError::MissingNotFound)?;
        let forbidden = self.forbidden.ok_or(DispatcherError::MissingForbidden)?;
        if let Some(rule) = self
            .routes
            .values()
            .filter_map(|route| route.rule.as_ref())
            .find(|rule| rule.required_roles.is_empty())
        {
            return Err(DispatcherError::EmptyRoleSet(rule.path.clone()));
        }
        Ok(AuthDispatcher {
            store: self.store,
            routes: self.routes,
            not_found,
            forbidden,
        })
    }
}

/// Routes requests to registered handlers, consulting the session store for
/// guarded paths.
pub struct AuthDispatcher {
    store: Arc<SessionStore>,
    routes: HashMap<String, Route>,
    not_found: BoxedHandler,
    forbidden: BoxedHandler,
}

impl AuthDispatcher {
    pub fn builder(store: Arc<SessionStore>) -> AuthDispatcherBuilder {
        AuthDispatcherBuilder::new(store)
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Rule bound to `path`, if any.
    pub fn rule(&self, path: &str) -> Option<&AuthRule> {
        self.routes.get(path).and_then(|route| route.rule.as_ref())
    }

    /// Decide the fate of a request for `path` carrying session `token`.
    pub fn decide(&self, path: &str, token: Option<&str>) -> Decision {
        let Some(route) = self.routes.get(path) else {
            return Decision::NotFound;
        };
        let Some(rule) = &route.rule else {
            return Decision::Permit(None);
        };
        match token.and_then(|token| self.store.validate(token)) {
            Some(user) if rule.permits(&user) => Decision::Permit(Some(user)),
            Some(user) => {
                debug!(path, username = %user.username, "missing required role");
                Decision::Forbidden
            }
            None => {
                debug!(path, "no valid session for guarded route");
                Decision::Forbidden
            }
        }
    }

    /// Run exactly one handler for `request`.
    ///
    /// Sweeps idle sessions first; the store rate-limits the scan.
    pub async fn dispatch(&self, mut request: Request) -> Response {
        self.store.sweep_now();

        let path = request.uri().path().to_owned();
        let token = session_value(&CookieJar::from_headers(request.headers()));
        let handler = match self.decide(&path, token.as_deref()) {
            Decision::Permit(user) => {
                if let Some(user) = user {
                    request.extensions_mut().insert(CurrentUser(user));
                }
                self.routes.get(&path).map(|route| &route.handler)
            }
            Decision::Forbidden => Some(&self.forbidden),
            Decision::NotFound => None,
        };
        handler.unwrap_or(&self.not_found).handle(request).await
    }

    /// An axum router that hands every request to this dispatcher.
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(dispatch_request)
            .with_state(Arc::new(self))
    }
}

async fn dispatch_request(
    State(dispatcher): State<Arc<AuthDispatcher>>,
    request: Request,
) -> Response {
    dispatcher.dispatch(request).await
}

/// JSON 404 fallback.
pub fn default_not_found() -> impl RouteHandler {
    |request: Request| async move {
        ApiError::NotFound(format!("no route for {}", request.uri().path())).into_response()
    }
}

/// JSON 403 fallback.
pub fn default_forbidden() -> impl RouteHandler {
    |request: Request| async move {
        ApiError::Forbidden(format!("access to {} denied", request.uri().path())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::StatusCode;
    use gatehouse_core::roles::{ROLE_ADMIN, ROLE_MEMBER};
    use gatehouse_core::SessionConfig;

    use super::*;

    fn ok(body: &'static str) -> impl RouteHandler {
        move |_request: Request| async move { body.into_response() }
    }

    fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new(SessionConfig::default()))
    }

    fn dispatcher(store: Arc<SessionStore>) -> AuthDispatcher {
        AuthDispatcher::builder(store)
            .register_open_route("/", ok("home"))
            .register_guarded_route("/admin", ok("admin"), RoleSet::from_iter([ROLE_ADMIN]))
            .register_guarded_route(
                "/members",
                ok("members"),
                RoleSet::from_iter([ROLE_MEMBER, ROLE_ADMIN]),
            )
            .register_open_route(PAGE_NOT_FOUND, default_not_found())
            .register_open_route(PAGE_PROTECTED, default_forbidden())
            .build()
            .unwrap()
    }

    fn login(store: &SessionStore, name: &str, roles: &[&str]) -> String {
        let user = UserRecord::new(name, roles.iter().copied().collect());
        store.start_session(None, user).token.to_string()
    }

    #[test]
    fn unregistered_path_is_not_found() {
        let d = dispatcher(store());
        assert_eq!(d.decide("/nope", None), Decision::NotFound);
        assert_eq!(d.decide(PAGE_NOT_FOUND, None), Decision::NotFound);
    }

    #[test]
    fn open_route_ignores_session_state() {
        let store = store();
        let d = dispatcher(store.clone());
        assert_eq!(d.decide("/", None), Decision::Permit(None));
        assert_eq!(d.decide("/", Some("garbage")), Decision::Permit(None));
        let token = login(&store, "alice", &[ROLE_MEMBER]);
        assert_eq!(d.decide("/", Some(&token)), Decision::Permit(None));
    }

    #[test]
    fn guarded_route_requires_intersecting_role() {
        let store = store();
        let d = dispatcher(store.clone());
        let member = login(&store, "alice", &[ROLE_MEMBER]);
        let admin = login(&store, "bob", &[ROLE_ADMIN, ROLE_MEMBER]);

        assert_eq!(d.decide("/admin", Some(&member)), Decision::Forbidden);
        assert!(matches!(
            d.decide("/admin", Some(&admin)),
            Decision::Permit(Some(user)) if user.username == "bob"
        ));
        assert!(matches!(
            d.decide("/members", Some(&member)),
            Decision::Permit(Some(_))
        ));
        assert_eq!(d.decide("/admin", None), Decision::Forbidden);
        assert_eq!(d.decide("/admin", Some("garbage")), Decision::Forbidden);
    }

    #[test]
    fn substring_roles_do_not_match() {
        let store = store();
        let d = dispatcher(store.clone());
        let token = login(&store, "mallory", &["ROLE_ADMIN2", "ADMIN"]);
        assert_eq!(d.decide("/admin", Some(&token)), Decision::Forbidden);
    }

    #[test]
    fn last_registration_wins() {
        let d = AuthDispatcher::builder(store())
            .register_guarded_route("/x", ok("a"), RoleSet::from_iter([ROLE_ADMIN]))
            .register_open_route("/x", ok("b"))
            .set_not_found(default_not_found())
            .set_forbidden(default_forbidden())
            .build()
            .unwrap();
        assert!(d.rule("/x").is_none());
        assert_eq!(d.decide("/x", None), Decision::Permit(None));
    }

    #[test]
    fn build_requires_fallbacks() {
        let err = AuthDispatcher::builder(store())
            .set_forbidden(default_forbidden())
            .build()
            .err();
        assert_eq!(err, Some(DispatcherError::MissingNotFound));

        let err = AuthDispatcher::builder(store())
            .set_not_found(default_not_found())
            .build()
            .err();
        assert_eq!(err, Some(DispatcherError::MissingForbidden));
    }

    #[test]
    fn build_rejects_empty_role_set() {
        let err = AuthDispatcher::builder(store())
            .register_guarded_route("/void", ok("void"), RoleSet::new())
            .set_not_found(default_not_found())
            .set_forbidden(default_forbidden())
            .build()
            .err();
        assert_eq!(err, Some(DispatcherError::EmptyRoleSet("/void".into())));
    }

    #[tokio::test]
    async fn guarded_handler_sees_current_user() {
        let store = store();
        let token = login(&store, "alice", &[ROLE_MEMBER]);
        let d = AuthDispatcher::builder(store)
            .register_guarded_route(
                "/whoami",
                |request: Request| async move {
                    match request.extensions().get::<CurrentUser>() {
                        Some(CurrentUser(user)) => user.username.clone().into_response(),
                        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                    }
                },
                RoleSet::from_iter([ROLE_MEMBER]),
            )
            .set_not_found(default_not_found())
            .set_forbidden(default_forbidden())
            .build()
            .unwrap();

        let request = Request::builder()
            .uri("/whoami?x=1")
            .header("cookie", format!("session={token}"))
            .body(Body::empty())
            .unwrap();
        let resp = d.dispatch(request).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"alice");
    }
}
