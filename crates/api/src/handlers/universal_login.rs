use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use todo_auth::{AuthError, AuthSession};
use todo_models::NewUser;
use tracing::{error, warn};

use crate::handlers::auth::{request_context, Peer};
use crate::middleware::{session_token, OptionalUser};
use crate::state::AuthState;

const LOGIN_PATH: &str = "/auth/login";
const SIGNUP_PATH: &str = "/auth/signup";

// ============================================================================
// TEMPLATE STRUCTS
// ============================================================================

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    return_url: String,
    error: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate {
    return_url: String,
    error: String,
}

// ============================================================================
// QUERY/FORM STRUCTS
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AuthPageQuery {
    pub return_url: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub return_url: Option<String>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /auth/login
pub async fn login_page(
    OptionalUser(user): OptionalUser,
    Query(params): Query<AuthPageQuery>,
) -> Response {
    let return_url = sanitize_return_url(params.return_url.as_deref());

    if user.is_some() {
        return Redirect::to(&return_url).into_response();
    }

    render(LoginTemplate {
        return_url,
        error: params.error.unwrap_or_default(),
    })
}

/// POST /auth/login
pub async fn login_submit(
    State(state): State<Arc<AuthState>>,
    peer: Peer,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let return_url = sanitize_return_url(form.return_url.as_deref());

    match state
        .auth
        .login(&form.login, &form.password, request_context(&headers, peer))
        .await
    {
        Ok(session) => redirect_with_session(&state, &return_url, &session),
        Err(e) => {
            warn!("Form login failed: {}", e);
            redirect_with_error(LOGIN_PATH, &return_url, &user_message(&e))
        }
    }
}

/// GET /auth/signup
pub async fn signup_page(
    OptionalUser(user): OptionalUser,
    Query(params): Query<AuthPageQuery>,
) -> Response {
    let return_url = sanitize_return_url(params.return_url.as_deref());

    if user.is_some() {
        return Redirect::to(&return_url).into_response();
    }

    render(SignupTemplate {
        return_url,
        error: params.error.unwrap_or_default(),
    })
}

/// POST /auth/signup
pub async fn signup_submit(
    State(state): State<Arc<AuthState>>,
    peer: Peer,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> Response {
    let return_url = sanitize_return_url(form.return_url.as_deref());

    let new_user = NewUser {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password,
    };

    match state.auth.signup(new_user, request_context(&headers, peer)).await {
        Ok(session) => redirect_with_session(&state, &return_url, &session),
        Err(e) => {
            warn!("Form signup failed: {}", e);
            redirect_with_error(SIGNUP_PATH, &return_url, &user_message(&e))
        }
    }
}

/// GET /auth/logout
pub async fn logout(State(state): State<Arc<AuthState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers, &state.session.cookie_name) {
        if let Err(e) = state.auth.logout(&token).await {
            warn!("Logout failed: {}", e);
        }
    }

    let mut response = Redirect::to(LOGIN_PATH).into_response();
    if let Ok(value) = state.session.clear_cookie().parse() {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

// ============================================================================
// HELPERS
// ============================================================================

/// Keep only same-site absolute paths; anything else becomes `/`
pub fn sanitize_return_url(return_url: Option<&str>) -> String {
    match return_url.map(str::trim) {
        Some(url)
            if url.starts_with('/')
                && !url.starts_with("//")
                && !url.starts_with("/\\")
                && !url.contains("://")
                && !url.chars().any(char::is_control) =>
        {
            url.to_string()
        }
        _ => "/".to_string(),
    }
}

fn user_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => "Invalid username/email or password".to_string(),
        AuthError::UserInactive => "This account has been deactivated".to_string(),
        AuthError::WeakPassword(msg) => msg.clone(),
        AuthError::ValidationError(_) => {
            "Please check your username, email and password".to_string()
        }
        AuthError::AlreadyExists(_) => "That username or email is already registered".to_string(),
        _ => "Something went wrong, please try again".to_string(),
    }
}

fn render<T: Template>(template: T) -> Response {
    Html(template.render().unwrap_or_else(|e| {
        error!("Template render error: {}", e);
        "Error rendering page".to_string()
    }))
    .into_response()
}

fn redirect_with_session(state: &AuthState, return_url: &str, session: &AuthSession) -> Response {
    let mut response = Redirect::to(return_url).into_response();
    match state.session.set_cookie(&session.token).parse() {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        Err(e) => error!("Invalid session cookie: {}", e),
    }
    response
}

fn redirect_with_error(path: &str, return_url: &str, error: &str) -> Response {
    Redirect::to(&format!(
        "{}?return_url={}&error={}",
        path,
        urlencoding::encode(return_url),
        urlencoding::encode(error)
    ))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_sanitize_return_url() {
        assert_eq!(sanitize_return_url(None), "/");
        assert_eq!(sanitize_return_url(Some("/")), "/");
        assert_eq!(sanitize_return_url(Some("/todos")), "/todos");
        assert_eq!(sanitize_return_url(Some("/todos?page=2")), "/todos?page=2");

        assert_eq!(sanitize_return_url(Some("")), "/");
        assert_eq!(sanitize_return_url(Some("todos")), "/");
        assert_eq!(sanitize_return_url(Some("//evil.example.com")), "/");
        assert_eq!(sanitize_return_url(Some("/\\evil.example.com")), "/");
        assert_eq!(sanitize_return_url(Some("https://evil.example.com/")), "/");
        assert_eq!(sanitize_return_url(Some("/redirect?to=https://evil")), "/");
        assert_eq!(sanitize_return_url(Some("/a\r\nSet-Cookie: x=1")), "/");
    }

    #[test]
    fn test_redirect_with_error_encodes_parameters() {
        let response = redirect_with_error(LOGIN_PATH, "/todos?x=1", "Invalid username/email or password");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(
            location,
            "/auth/login?return_url=%2Ftodos%3Fx%3D1&error=Invalid%20username%2Femail%20or%20password"
        );
    }

    #[test]
    fn test_login_template_renders_error_and_return_url() {
        let html = LoginTemplate {
            return_url: "/todos".to_string(),
            error: "Bad <password>".to_string(),
        }
        .render()
        .unwrap();

        assert!(html.contains(r#"name="return_url""#));
        assert!(html.contains("todos"));
        assert!(html.contains("Bad &lt;password&gt;"));
        assert!(!html.contains("<password>"));
    }

    #[test]
    fn test_user_message_hides_internal_details() {
        let msg = user_message(&AuthError::Internal("db exploded".to_string()));
        assert!(!msg.contains("db"));
    }
}
