use crate::middleware::{client_ip, session_token, CurrentUser};
use crate::state::AuthState;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use todo_auth::{AuthError, AuthSession, RequestContext};
use todo_models::{NewUser, UserProfile};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: &str, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(error, message)))
}

/// Log the cause and answer with an opaque 500
pub fn internal_error(err: impl std::fmt::Display) -> ApiError {
    tracing::error!("Request failed: {}", err);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An internal error occurred",
    )
}

pub fn auth_error_response(err: AuthError) -> ApiError {
    let mapped = match &err {
        AuthError::InvalidCredentials => Some((StatusCode::UNAUTHORIZED, "invalid_credentials")),
        AuthError::InvalidToken(_) | AuthError::TokenExpired => {
            Some((StatusCode::UNAUTHORIZED, "invalid_token"))
        }
        AuthError::UserInactive => Some((StatusCode::FORBIDDEN, "user_inactive")),
        AuthError::Forbidden(_) => Some((StatusCode::FORBIDDEN, "forbidden")),
        AuthError::WeakPassword(_) => Some((StatusCode::BAD_REQUEST, "weak_password")),
        AuthError::ValidationError(_) => Some((StatusCode::BAD_REQUEST, "validation_error")),
        AuthError::NotFound(_) => Some((StatusCode::NOT_FOUND, "not_found")),
        AuthError::AlreadyExists(_) => Some((StatusCode::CONFLICT, "already_exists")),
        _ => None,
    };

    match mapped {
        Some((status, code)) => api_error(status, code, &err.to_string()),
        None => internal_error(err),
    }
}

/// Client address and user agent of the request
/// Peer address of the connection, when the server records it
pub type Peer = Option<ConnectInfo<SocketAddr>>;

pub fn request_context(headers: &HeaderMap, peer: Peer) -> RequestContext {
    RequestContext {
        ip_address: client_ip(headers, peer.map(|ConnectInfo(addr)| addr)),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.chars().take(512).collect()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginRequest {
    /// Username or email
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub roles: Vec<String>,
}

fn with_session_cookie(state: &AuthState, status: StatusCode, session: AuthSession) -> Response {
    let cookie = state.session.set_cookie(&session.token);
    (status, [(header::SET_COOKIE, cookie)], Json(session)).into_response()
}

/// POST /auth/api/login
pub async fn api_login(
    State(state): State<Arc<AuthState>>,
    peer: Peer,
    headers: HeaderMap,
    Json(request): Json<ApiLoginRequest>,
) -> Result<Response, ApiError> {
    let session = state
        .auth
        .login(&request.login, &request.password, request_context(&headers, peer))
        .await
        .map_err(auth_error_response)?;

    Ok(with_session_cookie(&state, StatusCode::OK, session))
}

/// POST /auth/api/signup
pub async fn api_signup(
    State(state): State<Arc<AuthState>>,
    peer: Peer,
    headers: HeaderMap,
    Json(request): Json<NewUser>,
) -> Result<Response, ApiError> {
    let session = state
        .auth
        .signup(request, request_context(&headers, peer))
        .await
        .map_err(auth_error_response)?;

    Ok(with_session_cookie(&state, StatusCode::CREATED, session))
}

/// POST /auth/api/logout
pub async fn api_logout(State(state): State<Arc<AuthState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers, &state.session.cookie_name) {
        if let Err(e) = state.auth.logout(&token).await {
            tracing::warn!("Logout failed: {}", e);
        }
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.session.clear_cookie())],
    )
        .into_response()
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AuthState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
    let profile = state
        .auth
        .get_user(user.user_id)
        .await
        .map_err(auth_error_response)?;

    Ok(Json(MeResponse {
        user: profile.into(),
        roles: user.roles,
    }))
}
