pub mod admin;
pub mod auth;
pub mod health;
pub mod organizations;
pub mod pages;
pub mod todos;
pub mod universal_login;

// Re-export common types
pub use auth::{ApiError, ErrorResponse};
