//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::infra::Database;
use crate::services::{
    AuditService, AuthService, HierarchyService, SecretKeyService, ServiceContainer, Services,
    UserService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// User service
    pub user_service: Arc<dyn UserService>,
    /// Hierarchy service
    pub hierarchy_service: Arc<dyn HierarchyService>,
    /// Audit service
    pub audit_service: Arc<dyn AuditService>,
    /// Secret key service
    pub secret_key_service: Arc<dyn SecretKeyService>,
    /// Database connection
    pub database: Arc<Database>,
}

impl AppState {
    /// Create application state from database connection and config.
    pub fn from_config(database: Arc<Database>, config: crate::config::Config) -> Self {
        let container = Services::from_connection(database.get_connection(), config);

        Self {
            auth_service: container.auth(),
            user_service: container.users(),
            hierarchy_service: container.hierarchy(),
            audit_service: container.audit(),
            secret_key_service: container.secret_keys(),
            database,
        }
    }

    /// Create new application state with manually injected services.
    /// Used by tests that substitute mock services.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        hierarchy_service: Arc<dyn HierarchyService>,
        audit_service: Arc<dyn AuditService>,
        secret_key_service: Arc<dyn SecretKeyService>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            hierarchy_service,
            audit_service,
            secret_key_service,
            database,
        }
    }
}
