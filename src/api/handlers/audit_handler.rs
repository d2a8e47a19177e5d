//! Audit trail handlers.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::extractors::{ClientInfo, ValidatedJson};
use crate::api::middleware::{require_admin_or_above, CurrentUser};
use crate::api::AppState;
use crate::domain::{AuditEntry, AuditLogFilter};
use crate::errors::AppResult;
use crate::services::PurgeOutcome;
use crate::types::{Paginated, PaginationParams};

/// Audit trail query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditLogQuery {
    /// Substring of the action code to match
    pub action: Option<String>,
    /// Exact resource class to match
    pub resource_type: Option<String>,
    /// Substring of the actor identity to match
    pub performed_by: Option<String>,
    /// Inclusive lower bound on entry time
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on entry time
    pub until: Option<DateTime<Utc>>,
    /// Page number, 1-indexed
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
}

/// Retention purge request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PurgeRequest {
    /// Days of trail to keep; entries older than this are dropped
    #[validate(range(min = 1, message = "retain_days must be positive"))]
    pub retain_days: i64,
}

/// Protected audit routes (require JWT; role checks inside)
pub fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_audit_logs))
        .route("/purge", post(purge_audit_logs))
}

/// Query the audit trail, newest first
#[utoipa::path(
    get,
    path = "/audit-logs",
    tag = "Audit",
    security(("bearer_auth" = [])),
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Matching trail entries"),
        (status = 403, description = "Caller is not ADMIN or above")
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<Paginated<AuditEntry>>> {
    require_admin_or_above(&actor)?;

    let filter = AuditLogFilter {
        action: query.action,
        resource_type: query.resource_type,
        performed_by: query.performed_by,
        from: query.from,
        until: query.until,
    };
    let pagination = PaginationParams {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(crate::config::DEFAULT_PAGE_SIZE),
    };

    let (entries, total) = state.audit_service.query(filter, pagination.clone()).await?;

    Ok(Json(Paginated::new(
        entries,
        pagination.page,
        pagination.limit(),
        total,
    )))
}

/// Purge trail entries older than the requested retention window
#[utoipa::path(
    post,
    path = "/audit-logs/purge",
    tag = "Audit",
    security(("bearer_auth" = [])),
    request_body = PurgeRequest,
    responses(
        (status = 200, description = "Purge outcome", body = PurgeOutcome),
        (status = 400, description = "Retention window below the configured floor"),
        (status = 403, description = "Caller is not a MASTER")
    )
)]
pub async fn purge_audit_logs(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<PurgeRequest>,
) -> AppResult<Json<PurgeOutcome>> {
    let outcome = state
        .audit_service
        .purge(&actor, payload.retain_days, client.into_context())
        .await?;

    Ok(Json(outcome))
}
