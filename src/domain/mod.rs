//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns.
//!
//! DDD: Domain layer has NO external dependencies (except error types).
//! Contains: Entities, Value Objects, Domain Services.

pub mod audit;
pub mod password;
pub mod policy;
pub mod role;
pub mod secret_code;
pub mod user;

pub use audit::{AuditEntry, AuditEvent, AuditLogFilter, RequestContext};
pub use password::Password;
pub use policy::{MasterPolicy, PolicyDecision};
pub use role::Role;
pub use secret_code::SecretCode;
pub use user::{User, UserFilters, UserResponse, VisibilityScope};
