use crate::handlers::auth::{ApiError, ErrorResponse};
use crate::state::AuthState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use std::sync::Arc;
use todo_auth::AuthenticatedUser;
use uuid::Uuid;

/// Authenticated user context
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<AuthenticatedUser> for AuthUser {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
            roles: user.roles,
        }
    }
}

/// Session token from the session cookie, falling back to a Bearer header
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

/// Attach the caller's `AuthUser` to the request when it carries a valid
/// session. Anything else leaves the request anonymous.
pub async fn resolve_session(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers(), &state.session.cookie_name) {
        match state.auth.authenticate(&token).await {
            Ok(user) => {
                request.extensions_mut().insert(AuthUser::from(user));
            }
            Err(e) => tracing::debug!("Treating request as anonymous: {}", e),
        }
    }

    next.run(request).await
}

fn not_authenticated() -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("not_authenticated", "Authentication required")),
    )
}

/// The logged-in caller; rejects anonymous requests with 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(not_authenticated)
    }
}

/// The logged-in caller, if any
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthUser>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}

/// Role a route group demands, passed as middleware state
#[derive(Debug, Clone, Copy)]
pub struct RequiredRole(pub &'static str);

/// Middleware to require a global role. Must run after `resolve_session`.
pub async fn require_role(
    State(RequiredRole(role)): State<RequiredRole>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(not_authenticated)?;

    if !user.has_role(role) {
        tracing::warn!(user_id = %user.user_id, role, "Missing required role");
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "insufficient_permissions",
                &format!("The '{}' role is required", role),
            )),
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Request};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn user(roles: &[&str]) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn admin_app() -> Router {
        Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(from_fn_with_state(RequiredRole("Admin"), require_role))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_token=abc.def.ghi; other=1"),
        );
        assert_eq!(
            session_token(&headers, "session_token"),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(session_token(&headers, "sid"), None);
    }

    #[test]
    fn test_session_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok123"));
        assert_eq!(session_token(&headers, "session_token"), Some("tok123".to_string()));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(session_token(&headers, "session_token"), None);
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(
            session_token(&headers, "session_token"),
            Some("from-cookie".to_string())
        );
    }

    #[tokio::test]
    async fn test_require_role_rejects_anonymous() {
        let req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = admin_app().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "not_authenticated");
    }

    #[tokio::test]
    async fn test_require_role_rejects_missing_role() {
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut().insert(user(&["User"]));
        let response = admin_app().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "insufficient_permissions");
    }

    #[tokio::test]
    async fn test_require_role_allows_role_holder() {
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        req.extensions_mut().insert(user(&["User", "Admin"]));
        let response = admin_app().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_current_user_extractor() {
        let app = Router::new().route(
            "/me",
            get(|CurrentUser(user): CurrentUser| async move { user.username }),
        );

        let req = Request::builder().uri("/me").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut req = Request::builder().uri("/me").body(Body::empty()).unwrap();
        req.extensions_mut().insert(user(&["User"]));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"alice");
    }

    #[tokio::test]
    async fn test_optional_user_extractor() {
        let app = Router::new().route(
            "/whoami",
            get(|OptionalUser(user): OptionalUser| async move {
                user.map(|u| u.username).unwrap_or_else(|| "anonymous".to_string())
            }),
        );

        let req = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"anonymous");
    }
}
