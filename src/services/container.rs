//! Service Container - Centralized service access.
//!
//! SOLID (SRP): Manages service lifecycle and access.
//! SOLID (DIP): Depends on service traits, not implementations.

use std::sync::Arc;

use super::{
    AuditService, AuthService, HierarchyService, SecretKeyService, UserService,
};
use crate::config::Config;
use crate::domain::MasterPolicy;
use crate::infra::Persistence;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
///
/// Provides centralized access to all application services.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get user service
    fn users(&self) -> Arc<dyn UserService>;

    /// Get hierarchy service
    fn hierarchy(&self) -> Arc<dyn HierarchyService>;

    /// Get audit service
    fn audit(&self) -> Arc<dyn AuditService>;

    /// Get secret key service
    fn secret_keys(&self) -> Arc<dyn SecretKeyService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    hierarchy_service: Arc<dyn HierarchyService>,
    audit_service: Arc<dyn AuditService>,
    secret_key_service: Arc<dyn SecretKeyService>,
}

impl Services {
    /// Create service container from database connection and config.
    ///
    /// The master protection policy is constructed once from the
    /// configured recovery email and shared by every service that
    /// consults it.
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        use super::{
            AuditRecorder, Authenticator, HierarchyManager, SecretKeyManager, UserManager,
        };

        let policy = MasterPolicy::new(config.master_recovery_email.clone());
        let uow = Arc::new(Persistence::new(db));

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone(), config.clone())),
            user_service: Arc::new(UserManager::new(uow.clone(), policy.clone())),
            hierarchy_service: Arc::new(HierarchyManager::new(uow.clone(), policy)),
            audit_service: Arc::new(AuditRecorder::new(
                uow.clone(),
                config.audit_retention_min_days,
            )),
            secret_key_service: Arc::new(SecretKeyManager::new(
                uow,
                config.secret_key_single_use,
            )),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn hierarchy(&self) -> Arc<dyn HierarchyService> {
        self.hierarchy_service.clone()
    }

    fn audit(&self) -> Arc<dyn AuditService> {
        self.audit_service.clone()
    }

    fn secret_keys(&self) -> Arc<dyn SecretKeyService> {
        self.secret_key_service.clone()
    }
}
