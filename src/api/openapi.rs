//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{audit_handler, auth_handler, user_handler};
use crate::domain::{AuditEntry, Role, UserResponse};
use crate::services::{PurgeOutcome, TokenResponse};
use crate::types::MessageResponse;

/// OpenAPI documentation for the GigBooks backend
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GigBooks",
        version = "0.1.0",
        description = "Financial tracking backend for autonomous workers, with role hierarchy and account protection",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "API Support", email = "support@gigbooks.dev")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server"),
        (url = "https://api.gigbooks.dev", description = "Production server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        auth_handler::reset_by_recovery_key,
        // Recovery-key management
        auth_handler::issue_recovery_key,
        auth_handler::recovery_key_status,
        auth_handler::revoke_recovery_key,
        // User endpoints
        user_handler::list_users,
        user_handler::current_user,
        user_handler::complete_profile,
        user_handler::get_user,
        user_handler::delete_user,
        user_handler::set_user_status,
        // Hierarchy endpoints
        user_handler::promote_user,
        user_handler::demote_user,
        user_handler::set_admin_visibility,
        user_handler::block_user,
        user_handler::unblock_user,
        // Audit trail
        audit_handler::list_audit_logs,
        audit_handler::purge_audit_logs,
    ),
    components(
        schemas(
            // Domain types
            Role,
            UserResponse,
            AuditEntry,
            PurgeOutcome,
            MessageResponse,
            // Auth types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::RecoveryResetRequest,
            auth_handler::RecoveryKeyResponse,
            auth_handler::RecoveryKeyStatus,
            TokenResponse,
            // User handler types
            user_handler::ActionReasonRequest,
            user_handler::VisibilityRequest,
            user_handler::StatusRequest,
            user_handler::CompleteProfileRequest,
            // Audit handler types
            audit_handler::PurgeRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and password recovery"),
        (name = "Recovery", description = "MASTER recovery-key management"),
        (name = "Users", description = "Account management operations"),
        (name = "Hierarchy", description = "Role hierarchy operations"),
        (name = "Audit", description = "Audit trail queries and retention")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
