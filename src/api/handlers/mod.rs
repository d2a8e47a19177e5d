//! HTTP request handlers.

pub mod audit_handler;
pub mod auth_handler;
pub mod user_handler;

pub use audit_handler::audit_routes;
pub use auth_handler::{auth_routes, recovery_routes};
pub use user_handler::user_routes;
