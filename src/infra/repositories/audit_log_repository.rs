//! Audit log repository implementation.
//!
//! The trail is append-only: there is no update path, and the single
//! delete path is the retention cutoff used by the purge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use uuid::Uuid;

use super::entities::audit_log::{self, ActiveModel, Entity as AuditLogEntity};
use crate::domain::{AuditEntry, AuditEvent, AuditLogFilter, RequestContext};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Audit log repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Persist one entry, assigning id and timestamp
    async fn insert(&self, event: AuditEvent, ctx: RequestContext) -> AppResult<AuditEntry>;

    /// Query the trail, newest first
    async fn query(
        &self,
        filter: AuditLogFilter,
        pagination: PaginationParams,
    ) -> AppResult<(Vec<AuditEntry>, u64)>;

    /// Delete entries created strictly before the cutoff, returning the
    /// number removed
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Concrete implementation of AuditLogRepository
pub struct AuditLogStore {
    db: DatabaseConnection,
}

impl AuditLogStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered_query(filter: &AuditLogFilter) -> Select<AuditLogEntity> {
        let mut query = AuditLogEntity::find();

        if let Some(action) = &filter.action {
            query = query.filter(audit_log::Column::Action.contains(action));
        }
        if let Some(resource_type) = &filter.resource_type {
            query = query.filter(audit_log::Column::ResourceType.eq(resource_type));
        }
        if let Some(performed_by) = &filter.performed_by {
            query = query.filter(audit_log::Column::PerformedBy.contains(performed_by));
        }
        if let Some(from) = filter.from {
            query = query.filter(audit_log::Column::CreatedAt.gte(from));
        }
        if let Some(until) = filter.until {
            query = query.filter(audit_log::Column::CreatedAt.lte(until));
        }

        query.order_by_desc(audit_log::Column::CreatedAt)
    }
}

/// Build the active model for one entry. Shared between the pooled
/// store and the transactional repository.
pub(crate) fn build_entry(event: AuditEvent, ctx: RequestContext) -> ActiveModel {
    ActiveModel {
        id: Set(Uuid::new_v4()),
        action: Set(event.action),
        resource_type: Set(event.resource_type),
        resource_id: Set(event.resource_id),
        performed_by: Set(event.performed_by),
        performed_by_role: Set(event.performed_by_role),
        description: Set(event.description),
        details: Set(event.details),
        ip_address: Set(ctx.ip_address),
        user_agent: Set(ctx.user_agent),
        created_at: Set(Utc::now()),
    }
}

#[async_trait]
impl AuditLogRepository for AuditLogStore {
    async fn insert(&self, event: AuditEvent, ctx: RequestContext) -> AppResult<AuditEntry> {
        let model = build_entry(event, ctx)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(AuditEntry::from(model))
    }

    async fn query(
        &self,
        filter: AuditLogFilter,
        pagination: PaginationParams,
    ) -> AppResult<(Vec<AuditEntry>, u64)> {
        let paginator = Self::filtered_query(&filter).paginate(&self.db, pagination.limit());

        let total = paginator.num_items().await?;
        let models = paginator
            .fetch_page(pagination.page.saturating_sub(1))
            .await?;

        Ok((models.into_iter().map(AuditEntry::from).collect(), total))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = AuditLogEntity::delete_many()
            .filter(audit_log::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected)
    }
}
