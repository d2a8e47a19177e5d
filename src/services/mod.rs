//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.
//!
//! All services use Unit of Work pattern for centralized repository
//! access; the hierarchy and user services additionally run their
//! mutations inside transactions so state and audit trail commit
//! together.

mod audit_service;
mod auth_service;
pub mod container;
mod hierarchy_service;
mod secret_key_service;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use audit_service::{AuditRecorder, AuditService, PurgeOutcome};
pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};
pub use hierarchy_service::{can_manage, HierarchyManager, HierarchyService};
pub use secret_key_service::{SecretKeyManager, SecretKeyService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
