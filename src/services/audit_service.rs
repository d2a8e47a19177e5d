//! Audit service - Records and queries the privileged-action trail.
//!
//! SOLID (SRP): Trail concerns only; the decisions being recorded live
//! in the policy and hierarchy services.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::domain::audit::actions;
use crate::domain::{AuditEntry, AuditEvent, AuditLogFilter, RequestContext, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::types::PaginationParams;

/// Result of a retention purge
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurgeOutcome {
    /// Number of entries removed
    pub removed: u64,
    /// Entries created before this instant were dropped
    pub cutoff: DateTime<Utc>,
    /// Days of trail kept
    pub retain_days: i64,
}

/// Audit service trait for dependency injection.
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Persist a prepared event
    async fn record(&self, event: AuditEvent, ctx: RequestContext) -> AppResult<AuditEntry>;

    /// Record a privileged action against a user account
    async fn record_user_action(
        &self,
        action: &str,
        target: &User,
        actor: &User,
        description: String,
        extra: Option<serde_json::Value>,
        ctx: RequestContext,
    ) -> AppResult<AuditEntry>;

    /// Record an authentication attempt
    async fn record_auth_action(
        &self,
        action: &str,
        email: &str,
        description: String,
        success: bool,
        extra: Option<serde_json::Value>,
        ctx: RequestContext,
    ) -> AppResult<AuditEntry>;

    /// Query the trail, newest first
    async fn query(
        &self,
        filter: AuditLogFilter,
        pagination: PaginationParams,
    ) -> AppResult<(Vec<AuditEntry>, u64)>;

    /// Drop entries older than `retain_days`. MASTER only; the retention
    /// floor is enforced, and the purge itself leaves a trail entry.
    async fn purge(
        &self,
        actor: &User,
        retain_days: i64,
        ctx: RequestContext,
    ) -> AppResult<PurgeOutcome>;
}

/// Concrete implementation of AuditService using Unit of Work.
pub struct AuditRecorder<U: UnitOfWork> {
    uow: Arc<U>,
    retention_min_days: i64,
}

impl<U: UnitOfWork> AuditRecorder<U> {
    /// Create new audit service instance with Unit of Work
    pub fn new(uow: Arc<U>, retention_min_days: i64) -> Self {
        Self {
            uow,
            retention_min_days,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuditService for AuditRecorder<U> {
    async fn record(&self, event: AuditEvent, ctx: RequestContext) -> AppResult<AuditEntry> {
        self.uow.audit_logs().insert(event, ctx).await
    }

    async fn record_user_action(
        &self,
        action: &str,
        target: &User,
        actor: &User,
        description: String,
        extra: Option<serde_json::Value>,
        ctx: RequestContext,
    ) -> AppResult<AuditEntry> {
        let event = AuditEvent::user_action(action, target, actor, description, extra);
        self.uow.audit_logs().insert(event, ctx).await
    }

    async fn record_auth_action(
        &self,
        action: &str,
        email: &str,
        description: String,
        success: bool,
        extra: Option<serde_json::Value>,
        ctx: RequestContext,
    ) -> AppResult<AuditEntry> {
        let event = AuditEvent::auth_action(action, email, description, success, extra);
        self.uow.audit_logs().insert(event, ctx).await
    }

    async fn query(
        &self,
        filter: AuditLogFilter,
        pagination: PaginationParams,
    ) -> AppResult<(Vec<AuditEntry>, u64)> {
        self.uow.audit_logs().query(filter, pagination).await
    }

    async fn purge(
        &self,
        actor: &User,
        retain_days: i64,
        ctx: RequestContext,
    ) -> AppResult<PurgeOutcome> {
        if !actor.role.is_master() {
            return Err(AppError::forbidden("only a MASTER may purge audit logs"));
        }

        // Asking to keep less than the floor is an operator mistake,
        // not something to silently round up
        if retain_days < self.retention_min_days {
            return Err(AppError::validation(format!(
                "retention must keep at least {} days of audit history",
                self.retention_min_days
            )));
        }

        let cutoff = Utc::now() - Duration::days(retain_days);
        let removed = self.uow.audit_logs().delete_older_than(cutoff).await?;

        tracing::info!(
            removed,
            %cutoff,
            performed_by = %actor.email,
            "audit retention purge completed"
        );

        // The purge is itself a privileged action and leaves a trail
        let event = AuditEvent::system_action(
            actions::PURGE_AUDIT_LOGS,
            actor.email.clone(),
            Some(actor.role.to_string()),
            format!("Purged {} audit entries older than {} days", removed, retain_days),
            Some(serde_json::json!({
                "removed": removed,
                "cutoff": cutoff,
                "retain_days": retain_days,
            })),
        );
        self.uow.audit_logs().insert(event, ctx).await?;

        Ok(PurgeOutcome {
            removed,
            cutoff,
            retain_days,
        })
    }
}
