use crate::error::{AuthError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};

const DEFAULT_MIN_LENGTH: usize = 8;

pub struct PasswordHasher;

impl PasswordHasher {
    /// Hash a password using Argon2id
    pub fn hash(password: &str) -> Result<String> {
        Self::validate_password(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn min_length() -> usize {
        std::env::var("PASSWORD_MIN_LENGTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MIN_LENGTH)
    }

    pub fn validate_password(password: &str) -> Result<()> {
        let min_length = Self::min_length();

        if password.chars().count() < min_length {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                min_length
            )));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one uppercase letter".to_string(),
            ));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one lowercase letter".to_string(),
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::WeakPassword(
                "Password must contain at least one number".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "MySecureP@ssw0rd";
        let hash = PasswordHasher::hash(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordHasher::verify(password, &hash).unwrap());
        assert!(!PasswordHasher::verify("WrongPassword1!", &hash).unwrap());
    }

    #[test]
    fn test_password_validation() {
        // Too short
        assert!(PasswordHasher::hash("Short1!").is_err());

        // No uppercase
        assert!(PasswordHasher::hash("nouppercase1!").is_err());

        // No lowercase
        assert!(PasswordHasher::hash("NOLOWERCASE1!").is_err());

        // No number
        assert!(PasswordHasher::hash("NoNumbers!").is_err());

        assert!(PasswordHasher::hash("ValidPassw0rd").is_ok());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(PasswordHasher::verify("Whatever1", "not-a-phc-string").is_err());
    }
}
