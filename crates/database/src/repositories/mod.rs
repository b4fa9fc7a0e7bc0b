pub mod users;
pub mod sessions;
pub mod organizations;
pub mod roles;
pub mod deleted_users;
pub mod todos;
