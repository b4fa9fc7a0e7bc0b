pub mod bootstrap;
pub mod error;
pub mod jwt;
pub mod organization_service;
pub mod password;
pub mod service;

pub use bootstrap::{bootstrap, BootstrapConfig};
pub use error::{AuthError, Result};
pub use jwt::{hash_token, SessionClaims, SessionTokens};
pub use organization_service::OrganizationService;
pub use password::PasswordHasher;
pub use service::{AuthService, AuthSession, AuthenticatedUser, RequestContext};
