//! JWT authentication middleware.
//!
//! Claims establish identity only. The middleware re-fetches the live
//! user row on every request, so a demoted, disabled or blocked
//! account's outstanding token loses privilege immediately instead of
//! at token expiry.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::User;
use crate::errors::{AppError, AppResult};

/// The live user record resolved for this request.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

/// JWT authentication middleware.
///
/// Decodes the bearer token, loads the live user record by the token's
/// subject id, and injects it into the request extensions. Missing,
/// soft-deleted, inactive and blocked accounts are all rejected as
/// unauthenticated rather than not-found.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let claims = state.auth_service.verify_token(token)?;

    // The role claim in the token is never trusted; only the live row
    // decides what this actor may do.
    let user = state
        .user_service
        .get_user(claims.sub)
        .await
        .map_err(|e| match e {
            AppError::NotFound => AppError::Unauthorized,
            other => other,
        })?;

    if !user.can_authenticate() {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Require the MASTER role, with the specific refusal reason.
pub fn require_master(user: &User) -> AppResult<()> {
    if user.role.is_master() {
        Ok(())
    } else {
        Err(AppError::forbidden("this operation requires a MASTER account"))
    }
}

/// Require ADMIN standing or above.
pub fn require_admin_or_above(user: &User) -> AppResult<()> {
    if user.role.is_admin_or_above() {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "this operation requires an ADMIN or MASTER account",
        ))
    }
}
