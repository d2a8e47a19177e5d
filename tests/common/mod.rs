//! Shared test fixtures for service-level tests.
//!
//! Services are exercised against mocked repositories through a test
//! Unit of Work. The transaction path needs a live database connection,
//! so it fails here; operations whose behavior lives entirely inside a
//! transaction are covered by the gate tests next to the services.

// Not every test binary touches every fixture
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use gigbooks::domain::{AuditEntry, AuditEvent, RequestContext, Role, User};
use gigbooks::errors::{AppError, AppResult};
use gigbooks::infra::{
    AuditLogRepository, MockAuditLogRepository, MockUserRepository, TransactionContext,
    UnitOfWork, UserRepository,
};

/// Unit of Work backed by mock repositories.
pub struct TestUnitOfWork {
    users: Arc<MockUserRepository>,
    audit_logs: Arc<MockAuditLogRepository>,
}

impl TestUnitOfWork {
    pub fn new(users: MockUserRepository, audit_logs: MockAuditLogRepository) -> Self {
        Self {
            users: Arc::new(users),
            audit_logs: Arc::new(audit_logs),
        }
    }
}

#[async_trait]
impl UnitOfWork for TestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn audit_logs(&self) -> Arc<dyn AuditLogRepository> {
        self.audit_logs.clone()
    }

    async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        Err(AppError::internal(
            "transactions require a live database connection",
        ))
    }
}

/// Build an account with the given role
pub fn account(role: Role, email: &str) -> User {
    let mut user = User::new(
        Uuid::new_v4(),
        email.to_string(),
        email.split('@').next().unwrap().to_string(),
        "hash".to_string(),
        "Test Account".to_string(),
    );
    user.role = role;
    user
}

/// Materialize an event the way an insert would
pub fn persisted(event: AuditEvent, ctx: RequestContext) -> AuditEntry {
    AuditEntry {
        id: Uuid::new_v4(),
        action: event.action,
        resource_type: event.resource_type,
        resource_id: event.resource_id,
        performed_by: event.performed_by,
        performed_by_role: event.performed_by_role,
        description: event.description,
        details: event.details,
        ip_address: ctx.ip_address,
        user_agent: ctx.user_agent,
        created_at: Utc::now(),
    }
}
