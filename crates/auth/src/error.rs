use thiserror::Error;
use todo_authz::AuthzError;
use todo_database::DatabaseError;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User account is inactive")]
    UserInactive,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Cache error: {0}")]
    CacheError(#[from] todo_cache::CacheError),

    #[error("Password hashing error: {0}")]
    PasswordHashError(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => AuthError::NotFound(msg),
            DatabaseError::DuplicateEntry(msg) => AuthError::AlreadyExists(msg),
            other => AuthError::Database(other),
        }
    }
}

impl From<AuthzError> for AuthError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Database(e) => e.into(),
            AuthzError::ValidationError(msg) => AuthError::ValidationError(msg),
            AuthzError::PermissionDenied(msg) => AuthError::Forbidden(msg),
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHashError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature => {
                AuthError::InvalidToken(err.to_string())
            }
            _ => AuthError::JwtError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(err.to_string())
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Database(DatabaseError::ConnectionError(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_map_to_domain_errors() {
        let err: AuthError = DatabaseError::not_found("User", "42").into();
        assert!(matches!(err, AuthError::NotFound(_)));

        let err: AuthError = DatabaseError::duplicate("User", "this email").into();
        assert!(matches!(err, AuthError::AlreadyExists(_)));

        let err: AuthError = DatabaseError::Other("boom".to_string()).into();
        assert!(matches!(err, AuthError::Database(_)));
    }

    #[test]
    fn test_authz_errors_map_to_domain_errors() {
        let err: AuthError = AuthzError::PermissionDenied("nope".to_string()).into();
        assert!(matches!(err, AuthError::Forbidden(_)));

        let err: AuthError =
            AuthzError::Database(DatabaseError::not_found("Role", "Admin")).into();
        assert!(matches!(err, AuthError::NotFound(_)));
    }
}
