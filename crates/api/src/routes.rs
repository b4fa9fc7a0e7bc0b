use crate::handlers;
use crate::middleware::{self, RequiredRole};
use crate::state::{AdvancedState, AuthState, SimpleState};
use axum::{
    extract::FromRef,
    handler::Handler,
    http::{request::Parts, HeaderValue},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use todo_models::role::names;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

lazy_static::lazy_static! {
    static ref LOCAL_ORIGIN: regex::Regex = regex::Regex::new(r"^http://localhost(:[0-9]+)?$").unwrap();
}

/// Login, signup and session routes under `/auth`
pub fn auth_routes<S>(auth: &Arc<AuthState>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Arc<AuthState>: FromRef<S>,
{
    let login_limit = || from_fn_with_state(auth.cache.clone(), middleware::rate_limit_login);
    let signup_limit = || from_fn_with_state(auth.cache.clone(), middleware::rate_limit_signup);

    Router::new()
        // HTML forms
        .route(
            "/auth/login",
            get(handlers::universal_login::login_page)
                .post(handlers::universal_login::login_submit.layer(login_limit())),
        )
        .route(
            "/auth/signup",
            get(handlers::universal_login::signup_page)
                .post(handlers::universal_login::signup_submit.layer(signup_limit())),
        )
        .route("/auth/logout", get(handlers::universal_login::logout))
        // JSON API
        .route(
            "/auth/api/login",
            post(handlers::auth::api_login).layer(login_limit()),
        )
        .route(
            "/auth/api/signup",
            post(handlers::auth::api_signup).layer(signup_limit()),
        )
        .route("/auth/api/logout", post(handlers::auth::api_logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// Server-rendered app over relational todos
pub fn simple_router(state: SimpleState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/", get(handlers::pages::index))
        .route("/todos", get(handlers::pages::list_todos))
        .route("/todos/add", post(handlers::pages::add_todo))
        .route("/todos/:todo_id/delete", get(handlers::pages::delete_todo))
        .merge(auth_routes::<SimpleState>(&state.auth))
        .layer(from_fn_with_state(state.auth.clone(), middleware::resolve_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON API over organization-scoped todo documents
pub fn advanced_router(state: AdvancedState) -> Router {
    let admin = Router::<AdvancedState>::new()
        .route(
            "/api/admin/run-cleanup-step",
            post(handlers::admin::run_cleanup_step),
        )
        .route("/api/admin/users/:user_id", delete(handlers::admin::delete_user))
        .route_layer(from_fn_with_state(
            RequiredRole(names::ADMIN),
            middleware::require_role,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/todos",
            get(handlers::todos::list_todos).post(handlers::todos::create_todo),
        )
        .route("/api/todos/:todo_id", delete(handlers::todos::delete_todo))
        .route(
            "/api/orgs",
            get(handlers::organizations::list_organizations)
                .post(handlers::organizations::create_organization),
        )
        .route(
            "/api/orgs/:org_id/members",
            post(handlers::organizations::add_member),
        )
        .merge(admin)
        .merge(auth_routes::<AdvancedState>(&state.auth))
        .layer(from_fn_with_state(state.auth.clone(), middleware::resolve_session))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any `http://localhost` port
pub fn is_allowed_origin(origin: &HeaderValue) -> bool {
    origin
        .to_str()
        .map(|o| LOCAL_ORIGIN.is_match(o))
        .unwrap_or(false)
}

/// Credentialed CORS for local frontends, mirroring requested methods and headers
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _: &Parts| {
            is_allowed_origin(origin)
        }))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Route table for startup logging
pub const SIMPLE_ROUTES: &[&str] = &[
    "GET  /health",
    "GET  /",
    "GET  /todos",
    "POST /todos/add",
    "GET  /todos/:todo_id/delete",
];

pub const ADVANCED_ROUTES: &[&str] = &[
    "GET    /health",
    "GET    /api/todos",
    "POST   /api/todos",
    "DELETE /api/todos/:todo_id",
    "GET    /api/orgs",
    "POST   /api/orgs",
    "POST   /api/orgs/:org_id/members",
    "POST   /api/admin/run-cleanup-step  [Admin]",
    "DELETE /api/admin/users/:user_id    [Admin]",
];

pub const AUTH_ROUTES: &[&str] = &[
    "GET  /auth/login",
    "POST /auth/login",
    "GET  /auth/signup",
    "POST /auth/signup",
    "GET  /auth/logout",
    "POST /auth/api/login",
    "POST /auth/api/signup",
    "POST /auth/api/logout",
    "GET  /auth/me",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_allowed_origin() {
        assert!(is_allowed_origin(&HeaderValue::from_static("http://localhost")));
        assert!(is_allowed_origin(&HeaderValue::from_static("http://localhost:3000")));
        assert!(is_allowed_origin(&HeaderValue::from_static("http://localhost:5173")));

        assert!(!is_allowed_origin(&HeaderValue::from_static("https://localhost:3000")));
        assert!(!is_allowed_origin(&HeaderValue::from_static("http://localhost.evil.com")));
        assert!(!is_allowed_origin(&HeaderValue::from_static("http://localhost:3000/x")));
        assert!(!is_allowed_origin(&HeaderValue::from_static("http://example.com")));
    }
}
