//! Audit retention background job.
//!
//! Drops trail entries older than the requested window and leaves a
//! system entry describing the sweep. The configured retention floor
//! applies here exactly as it does to the HTTP purge endpoint.

use apalis::prelude::Data;
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::JOB_NAME_AUDIT_RETENTION;
use crate::domain::audit::actions;
use crate::domain::{AuditEvent, RequestContext};
use crate::errors::AppError;
use crate::infra::{AuditLogRepository, AuditLogStore};

/// Retention job payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRetentionJob {
    /// Days of trail to keep
    pub retain_days: i64,
}

impl AuditRetentionJob {
    pub fn new(retain_days: i64) -> Self {
        Self { retain_days }
    }
}

/// Worker-side dependencies, injected through apalis `Data`
#[derive(Clone)]
pub struct RetentionContext {
    pub db: Arc<DatabaseConnection>,
    /// Configured floor; jobs asking for a shorter window are clamped
    pub retention_min_days: i64,
}

/// Retention job handler, runs one sweep per job
pub async fn retention_job_handler(
    job: AuditRetentionJob,
    ctx: Data<RetentionContext>,
) -> Result<(), AppError> {
    // A job below the floor is clamped rather than failed; a scheduled
    // sweep should never wedge the queue over a config mismatch.
    let retain_days = job.retain_days.max(ctx.retention_min_days);
    if retain_days != job.retain_days {
        tracing::warn!(
            requested = job.retain_days,
            clamped_to = retain_days,
            "retention window below the configured floor, clamping"
        );
    }

    let cutoff = Utc::now() - Duration::days(retain_days);
    let store = AuditLogStore::new(ctx.db.as_ref().clone());

    let removed = store.delete_older_than(cutoff).await?;

    tracing::info!(removed, %cutoff, retain_days, "audit retention sweep complete");

    let event = AuditEvent::system_action(
        actions::PURGE_AUDIT_LOGS,
        JOB_NAME_AUDIT_RETENTION.to_string(),
        None,
        format!("Retention sweep removed {removed} entries older than {retain_days} days"),
        Some(serde_json::json!({
            "removed": removed,
            "cutoff": cutoff,
            "retain_days": retain_days,
        })),
    );
    store.insert(event, RequestContext::system()).await?;

    Ok(())
}
