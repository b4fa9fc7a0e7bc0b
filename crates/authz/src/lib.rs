pub mod error;
pub mod roles;

pub use error::{AuthzError, Result};
pub use roles::{RoleService, PERMISSION_CACHE_TTL_SECONDS};
