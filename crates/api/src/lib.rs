// Two todo applications sharing one session/role/organization auth layer.
//
// `simple-todo` renders pages over relational todos; `advanced-todo` serves
// a JSON API over organization-scoped todo documents.

pub mod cleanup;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod shutdown;
pub mod state;
pub mod telemetry;

pub use config::{Config, SessionSettings};
pub use state::{AdvancedState, AuthState, SimpleState};
