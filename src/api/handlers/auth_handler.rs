//! Authentication and recovery-key handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{ClientInfo, ValidatedJson};
use crate::api::middleware::{require_master, CurrentUser};
use crate::api::AppState;
use crate::domain::audit::actions;
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::TokenResponse;
use crate::types::MessageResponse;

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "driver@example.com")]
    pub email: String,
    /// Unique login name
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    #[schema(example = "driver42", min_length = 3)]
    pub username: String,
    /// User password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    /// User display name
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "John Doe")]
    pub name: String,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "driver@example.com")]
    pub email: String,
    /// User password
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Password reset by recovery key
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecoveryResetRequest {
    /// Login name of the MASTER account
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    #[schema(example = "founder")]
    pub username: String,
    /// The recovery key plaintext
    #[validate(length(min = 1, message = "Secret key is required"))]
    #[schema(example = "ABCD2345EFGH6789")]
    pub secret_key: String,
    /// Replacement password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(min_length = 8)]
    pub new_password: String,
}

/// A freshly issued recovery key. The plaintext appears here once and
/// is never persisted or logged.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct RecoveryKeyResponse {
    /// One-time plaintext recovery key
    #[schema(example = "ABCD2345EFGH6789")]
    pub secret_key: String,
    /// Days until the key expires
    pub valid_days: i64,
}

/// Current recovery-key state of the calling MASTER account
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct RecoveryKeyStatus {
    /// Whether an unexpired key is on file
    pub has_valid_key: bool,
    /// When the current key was issued
    pub created_at: Option<DateTime<Utc>>,
    /// When the key was last consumed
    pub used_at: Option<DateTime<Utc>>,
}

/// Public authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/recovery/reset", post(reset_by_recovery_key))
}

/// Recovery-key management routes; merged next to the public auth
/// routes behind the auth middleware
pub fn recovery_routes() -> Router<AppState> {
    Router::new().route(
        "/recovery",
        post(issue_recovery_key)
            .get(recovery_key_status)
            .delete(revoke_recovery_key),
    )
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "User already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth_service
        .register(
            payload.email,
            payload.username,
            payload.password,
            payload.name,
            client.into_context(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account blocked or disabled")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .auth_service
        .login(payload.email, payload.password, client.into_context())
        .await?;

    Ok(Json(token))
}

/// Issue a recovery key for the calling MASTER account
#[utoipa::path(
    post,
    path = "/auth/recovery",
    tag = "Recovery",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Key issued; plaintext returned once", body = RecoveryKeyResponse),
        (status = 403, description = "Caller is not a MASTER account")
    )
)]
pub async fn issue_recovery_key(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
) -> AppResult<(StatusCode, Json<RecoveryKeyResponse>)> {
    require_master(&actor)?;

    let ctx = client.into_context();
    let secret_key = state.secret_key_service.issue_for_master(&actor).await?;

    // The plaintext never reaches the trail; the entry records only
    // that a key was issued.
    state
        .audit_service
        .record_user_action(
            actions::GENERATE_SECRET_KEY,
            &actor,
            &actor,
            format!("Issued a recovery key for {}", actor.email),
            None,
            ctx,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecoveryKeyResponse {
            secret_key,
            valid_days: crate::config::SECRET_CODE_VALIDITY_DAYS,
        }),
    ))
}

/// Report the recovery-key state of the calling MASTER account
#[utoipa::path(
    get,
    path = "/auth/recovery",
    tag = "Recovery",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current key status", body = RecoveryKeyStatus)
    )
)]
pub async fn recovery_key_status(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
) -> AppResult<Json<RecoveryKeyStatus>> {
    let has_valid_key = state.secret_key_service.has_valid_key(actor.id).await?;

    Ok(Json(RecoveryKeyStatus {
        has_valid_key,
        created_at: actor.secret_key_created_at,
        used_at: actor.secret_key_used_at,
    }))
}

/// Revoke the calling MASTER account's recovery key
#[utoipa::path(
    delete,
    path = "/auth/recovery",
    tag = "Recovery",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Key revoked", body = MessageResponse),
        (status = 403, description = "Caller is not a MASTER account")
    )
)]
pub async fn revoke_recovery_key(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    client: ClientInfo,
) -> AppResult<Json<MessageResponse>> {
    require_master(&actor)?;

    let ctx = client.into_context();
    state.secret_key_service.revoke(&actor).await?;

    state
        .audit_service
        .record_user_action(
            actions::REVOKE_SECRET_KEY,
            &actor,
            &actor,
            format!("Revoked the recovery key of {}", actor.email),
            None,
            ctx,
        )
        .await?;

    Ok(Json(MessageResponse::new("Recovery key revoked")))
}

/// Reset a MASTER password using a recovery key
#[utoipa::path(
    post,
    path = "/auth/recovery/reset",
    tag = "Recovery",
    request_body = RecoveryResetRequest,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 401, description = "Invalid or expired recovery key")
    )
)]
pub async fn reset_by_recovery_key(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<RecoveryResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    let ctx = client.into_context();
    let user = state
        .secret_key_service
        .reset_password(&payload.username, &payload.secret_key, &payload.new_password)
        .await?;

    state
        .audit_service
        .record_auth_action(
            actions::PASSWORD_RESET_BY_SECRET_KEY,
            &user.email,
            format!("Password reset by recovery key for {}", user.email),
            true,
            None,
            ctx,
        )
        .await?;

    Ok(Json(MessageResponse::new("Password has been reset")))
}
