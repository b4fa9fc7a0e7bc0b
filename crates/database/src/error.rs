use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Database error: {0}")]
    Other(String),
}

impl DatabaseError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} with id {} not found", entity, id))
    }

    pub fn duplicate(entity: &str, field: &str) -> Self {
        Self::DuplicateEntry(format!("{} with {} already exists", entity, field))
    }

    /// Turn a unique-constraint violation into `DuplicateEntry`, pass anything else through
    pub fn from_insert(err: sqlx::Error, entity: &str, field: &str) -> Self {
        if is_unique_violation(&err) {
            Self::duplicate(entity, field)
        } else {
            Self::ConnectionError(err)
        }
    }
}

/// Postgres `unique_violation`
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DatabaseError::not_found("User", "42").to_string(),
            "Entity not found: User with id 42 not found"
        );
        assert_eq!(
            DatabaseError::duplicate("Organization", "slug").to_string(),
            "Duplicate entry: Organization with slug already exists"
        );
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));

        let err = DatabaseError::from_insert(sqlx::Error::RowNotFound, "User", "email");
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
    }
}
