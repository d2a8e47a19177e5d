//! Audit trail domain types.
//!
//! Entries are append-only: nothing in the crate updates one after
//! insert, and the only delete path is the retention purge.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::User;

/// Action codes written to the trail. Verb-noun, SCREAMING_SNAKE_CASE.
pub mod actions {
    pub const REGISTER_USER: &str = "REGISTER_USER";
    pub const LOGIN_SUCCESS: &str = "LOGIN_SUCCESS";
    pub const LOGIN_FAILED: &str = "LOGIN_FAILED";

    pub const PROMOTE_TO_ADMIN: &str = "PROMOTE_TO_ADMIN";
    pub const DEMOTE_TO_USER: &str = "DEMOTE_TO_USER";
    pub const TOGGLE_ADMIN_VISIBILITY: &str = "TOGGLE_ADMIN_VISIBILITY";
    pub const BLOCK_USER: &str = "BLOCK_USER";
    pub const UNBLOCK_USER: &str = "UNBLOCK_USER";
    pub const DISABLE_USER: &str = "DISABLE_USER";
    pub const ENABLE_USER: &str = "ENABLE_USER";
    pub const DELETE_USER: &str = "DELETE_USER";
    pub const COMPLETE_PROFILE: &str = "COMPLETE_PROFILE";

    pub const GENERATE_SECRET_KEY: &str = "GENERATE_SECRET_KEY";
    pub const REVOKE_SECRET_KEY: &str = "REVOKE_SECRET_KEY";
    pub const PASSWORD_RESET_BY_SECRET_KEY: &str = "PASSWORD_RESET_BY_SECRET_KEY";

    pub const PURGE_AUDIT_LOGS: &str = "PURGE_AUDIT_LOGS";
    pub const SEED_MASTER: &str = "SEED_MASTER";
}

/// Resource type tags grouping entries by what they touched.
pub mod resources {
    pub const USER: &str = "user";
    pub const AUTH: &str = "auth";
    pub const SYSTEM: &str = "system";
}

/// A persisted audit entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Action code, see [`actions`]
    #[schema(example = "PROMOTE_TO_ADMIN")]
    pub action: String,
    /// Resource class the action touched
    #[schema(example = "user")]
    pub resource_type: String,
    /// Id of the touched resource, when one exists
    pub resource_id: Option<Uuid>,
    /// Identity of the actor, usually their email
    #[schema(example = "founder@gigbooks.dev")]
    pub performed_by: String,
    /// Actor's role at the time of the action
    #[schema(example = "MASTER")]
    pub performed_by_role: Option<String>,
    pub description: String,
    /// Structured context, shape depends on the action
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An entry about to be written. Id and timestamp are assigned at insert.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub performed_by: String,
    pub performed_by_role: Option<String>,
    pub description: String,
    pub details: Option<serde_json::Value>,
}

/// Identity snapshot of the touched account, embedded in `details` so
/// the entry stays meaningful after the account changes or disappears.
fn target_snapshot(target: &User) -> serde_json::Value {
    serde_json::json!({
        "id": target.id,
        "email": target.email,
        "username": target.username,
        "name": target.name,
        "role": target.role,
    })
}

impl AuditEvent {
    /// Event for a privileged action against a user account.
    ///
    /// `extra` keys are merged next to the target snapshot; a non-object
    /// value lands under a "context" key.
    pub fn user_action(
        action: &str,
        target: &User,
        actor: &User,
        description: String,
        extra: Option<serde_json::Value>,
    ) -> Self {
        let mut details = serde_json::Map::new();
        details.insert("target".to_string(), target_snapshot(target));
        match extra {
            Some(serde_json::Value::Object(map)) => details.extend(map),
            Some(value) => {
                details.insert("context".to_string(), value);
            }
            None => {}
        }

        Self {
            action: action.to_string(),
            resource_type: resources::USER.to_string(),
            resource_id: Some(target.id),
            performed_by: actor.email.clone(),
            performed_by_role: Some(actor.role.to_string()),
            description,
            details: Some(serde_json::Value::Object(details)),
        }
    }

    /// Event for an authentication attempt, successful or not.
    pub fn auth_action(
        action: &str,
        email: &str,
        description: String,
        success: bool,
        extra: Option<serde_json::Value>,
    ) -> Self {
        let mut details = serde_json::Map::new();
        details.insert("success".to_string(), serde_json::Value::Bool(success));
        match extra {
            Some(serde_json::Value::Object(map)) => details.extend(map),
            Some(value) => {
                details.insert("context".to_string(), value);
            }
            None => {}
        }

        Self {
            action: action.to_string(),
            resource_type: resources::AUTH.to_string(),
            resource_id: None,
            performed_by: email.to_string(),
            performed_by_role: None,
            description,
            details: Some(serde_json::Value::Object(details)),
        }
    }

    /// Event for a system-level action such as the retention purge
    pub fn system_action(
        action: &str,
        performed_by: String,
        performed_by_role: Option<String>,
        description: String,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            action: action.to_string(),
            resource_type: resources::SYSTEM.to_string(),
            resource_id: None,
            performed_by,
            performed_by_role,
            description,
            details,
        }
    }
}

/// Where a request came from. Every field is optional: entries written
/// outside an HTTP request (CLI, background jobs) carry none of them.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Context for actions not tied to any request
    pub fn system() -> Self {
        Self::default()
    }
}

/// Trail query filter. All fields conjunctive; `action` and
/// `performed_by` match substrings, `resource_type` matches exactly.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub performed_by: Option<String>,
    /// Inclusive lower bound on created_at
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on created_at
    pub until: Option<DateTime<Utc>>,
}
