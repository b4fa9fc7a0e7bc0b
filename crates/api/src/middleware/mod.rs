pub mod auth;
pub mod rate_limit;

pub use auth::{
    require_role, resolve_session, session_token, AuthUser, CurrentUser, OptionalUser, RequiredRole,
};
pub use rate_limit::{client_ip, rate_limit_login, rate_limit_signup};
