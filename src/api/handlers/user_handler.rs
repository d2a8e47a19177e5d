//! User and hierarchy management handlers.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{ClientInfo, ValidatedJson};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{Role, User, UserFilters, UserResponse, VisibilityScope};
use crate::errors::{AppError, AppResult};
use crate::types::{NoContent, Paginated, PaginationParams};

/// Listing filters; applied on top of the caller's hierarchy scope
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Exact role to match
    pub role: Option<Role>,
    /// Active flag to match
    pub is_active: Option<bool>,
    /// Whether to return only blocked (true) or only unblocked (false)
    pub blocked: Option<bool>,
    /// Admin-visibility grant to match
    pub can_view_admins: Option<bool>,
    /// Page number, 1-indexed
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
}

/// Optional context for a hierarchy action
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ActionReasonRequest {
    /// Free-form operator note, recorded in the audit trail
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Admin-visibility toggle request
#[derive(Debug, Deserialize, ToSchema)]
pub struct VisibilityRequest {
    /// Whether the target ADMIN may see other admins in listings
    pub can_view_admins: bool,
}

/// Enable/disable request
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusRequest {
    /// Desired active state
    pub is_active: bool,
}

/// Profile completion request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CompleteProfileRequest {
    /// Updated display name
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
}

/// Protected user routes (require JWT)
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(current_user))
        .route("/me/profile", put(complete_profile))
        .route("/:id", get(get_user).delete(delete_user))
        .route("/:id/promote", post(promote_user))
        .route("/:id/demote", post(demote_user))
        .route("/:id/visibility", put(set_admin_visibility))
        .route("/:id/block", post(block_user))
        .route("/:id/unblock", post(unblock_user))
        .route("/:id/status", put(set_user_status))
}

/// List accounts visible to the caller
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Accounts inside the caller's hierarchy scope")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let filters = UserFilters {
        role: query.role,
        is_active: query.is_active,
        blocked: query.blocked,
        can_view_admins: query.can_view_admins,
    };
    let pagination = PaginationParams {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(crate::config::DEFAULT_PAGE_SIZE),
    };

    let (users, total) = state
        .hierarchy_service
        .get_visible_users(&actor, filters, pagination.clone())
        .await?;

    Ok(Json(Paginated::new(
        users.into_iter().map(UserResponse::from).collect(),
        pagination.page,
        pagination.limit(),
        total,
    )))
}

/// Get the calling account
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "The caller's account", body = UserResponse))
)]
pub async fn current_user(
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> Json<UserResponse> {
    Json(UserResponse::from(actor))
}

/// Complete the caller's pending admin profile
#[utoipa::path(
    put,
    path = "/users/me/profile",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CompleteProfileRequest,
    responses(
        (status = 200, description = "Profile completed", body = UserResponse),
        (status = 409, description = "Profile is not pending completion")
    )
)]
pub async fn complete_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<CompleteProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .complete_profile(&actor, payload.name, client.into_context())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Is `target` inside the actor's hierarchy scope?
fn visible_to(actor: &User, target: &User) -> bool {
    match VisibilityScope::for_actor(actor) {
        VisibilityScope::All => true,
        VisibilityScope::UsersAndAdmins => !target.role.is_master(),
        VisibilityScope::UsersOnly => target.role == Role::User,
        VisibilityScope::SelfOnly(id) => target.id == id,
    }
}

/// Get an account by id, subject to the caller's hierarchy scope
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "The account", body = UserResponse),
        (status = 404, description = "Not found or outside the caller's scope")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(id).await?;

    // An out-of-scope account is indistinguishable from a missing one
    if !visible_to(&actor, &user) {
        return Err(AppError::NotFound);
    }

    Ok(Json(UserResponse::from(user)))
}

/// Promote a USER account to ADMIN
#[utoipa::path(
    post,
    path = "/users/{id}/promote",
    tag = "Hierarchy",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = ActionReasonRequest,
    responses(
        (status = 200, description = "Account promoted", body = UserResponse),
        (status = 403, description = "Caller is not a MASTER"),
        (status = 409, description = "Target is not a USER account")
    )
)]
pub async fn promote_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ActionReasonRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .hierarchy_service
        .promote_to_admin(&actor, id, payload.reason, client.into_context())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Demote an ADMIN account to USER
#[utoipa::path(
    post,
    path = "/users/{id}/demote",
    tag = "Hierarchy",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = ActionReasonRequest,
    responses(
        (status = 200, description = "Account demoted", body = UserResponse),
        (status = 403, description = "Caller is not a MASTER"),
        (status = 409, description = "Target is not an ADMIN account")
    )
)]
pub async fn demote_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ActionReasonRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .hierarchy_service
        .demote_to_user(&actor, id, payload.reason, client.into_context())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Grant or revoke an ADMIN's visibility into other admins
#[utoipa::path(
    put,
    path = "/users/{id}/visibility",
    tag = "Hierarchy",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Visibility updated", body = UserResponse),
        (status = 403, description = "Caller is not a MASTER"),
        (status = 409, description = "Target is not an ADMIN account")
    )
)]
pub async fn set_admin_visibility(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(payload): Json<VisibilityRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .hierarchy_service
        .toggle_admin_visibility(&actor, id, payload.can_view_admins, client.into_context())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Block an account
#[utoipa::path(
    post,
    path = "/users/{id}/block",
    tag = "Hierarchy",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = ActionReasonRequest,
    responses(
        (status = 200, description = "Account blocked", body = UserResponse),
        (status = 403, description = "No standing, or the protection policy refused"),
        (status = 409, description = "Account is already blocked")
    )
)]
pub async fn block_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ActionReasonRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .hierarchy_service
        .block(&actor, id, payload.reason, client.into_context())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Unblock an account
#[utoipa::path(
    post,
    path = "/users/{id}/unblock",
    tag = "Hierarchy",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account unblocked", body = UserResponse),
        (status = 403, description = "Caller has no standing over the target"),
        (status = 409, description = "Account is not blocked")
    )
)]
pub async fn unblock_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .hierarchy_service
        .unblock(&actor, id, client.into_context())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Enable or disable an account
#[utoipa::path(
    put,
    path = "/users/{id}/status",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Active state updated", body = UserResponse),
        (status = 403, description = "No standing, or the protection policy refused"),
        (status = 409, description = "Account is already in the requested state")
    )
)]
pub async fn set_user_status(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .set_active(&actor, id, payload.is_active, client.into_context())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Soft delete an account
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "The protection policy refused"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .user_service
        .delete_user(&actor, id, client.into_context())
        .await?;

    Ok(NoContent)
}
