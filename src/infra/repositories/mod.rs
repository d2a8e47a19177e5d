//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod audit_log_repository;
pub(crate) mod entities;
mod user_repository;

pub use audit_log_repository::{AuditLogRepository, AuditLogStore};
pub use user_repository::{UserRepository, UserStore};

pub(crate) use audit_log_repository::build_entry;

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use audit_log_repository::MockAuditLogRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
