pub mod connection;
pub mod error;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{DatabaseError, Result};
pub use repositories::{
    deleted_users::DeletedUserRepository,
    organizations::OrganizationRepository,
    roles::RoleRepository,
    sessions::SessionRepository,
    todos::TodoRepository,
    users::UserRepository,
};
