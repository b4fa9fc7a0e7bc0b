// Core modules
pub mod user;
pub mod session;
pub mod organization;
pub mod organization_member;
pub mod role;
pub mod deleted_user;
pub mod todo;

// Re-export commonly used types
pub use user::{User, NewUser, UserProfile};
pub use session::{Session, NewSession};
pub use organization::{Organization, CreateOrganization};
pub use organization_member::{OrganizationMember, AddOrganizationMember};
pub use role::{Role, Permission};
pub use deleted_user::DeletedUser;
pub use todo::{Todo, NewTodo, TodoDocument, CreateTodoDocument};
