//! API middleware.

mod auth;

pub use auth::{auth_middleware, require_admin_or_above, require_master, CurrentUser};
