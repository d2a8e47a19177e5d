//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::role::Role;

/// User domain entity
///
/// Carries the full account state the hierarchy engine operates on:
/// role, activity/block status, admin visibility, promotion breadcrumbs,
/// recovery-key material and profile-completion tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,

    /// Whether the account may authenticate. Blocking forces this false.
    pub is_active: bool,
    pub blocked_at: Option<DateTime<Utc>>,
    pub blocked_by: Option<Uuid>,

    /// ADMIN accounts only: whether hierarchy listings include other admins
    pub can_view_admins: bool,
    pub promoted_by: Option<Uuid>,
    pub demoted_by: Option<Uuid>,
    pub demoted_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub secret_key_hash: Option<String>,
    pub secret_key_created_at: Option<DateTime<Utc>>,
    pub secret_key_used_at: Option<DateTime<Utc>>,

    pub requires_complete_profile: bool,
    pub profile_completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = present, Some = deleted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new account with the default USER role
    pub fn new(id: Uuid, email: String, username: String, password_hash: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            username,
            password_hash,
            name,
            role: Role::User,
            is_active: true,
            blocked_at: None,
            blocked_by: None,
            can_view_admins: false,
            promoted_by: None,
            demoted_by: None,
            demoted_at: None,
            secret_key_hash: None,
            secret_key_created_at: None,
            secret_key_used_at: None,
            requires_complete_profile: false,
            profile_completed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_master(&self) -> bool {
        self.role.is_master()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Check if the account is currently blocked
    pub fn is_blocked(&self) -> bool {
        self.blocked_at.is_some()
    }

    /// Check if the account is soft deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if the account may hold a session: present, active, not blocked
    pub fn can_authenticate(&self) -> bool {
        !self.is_deleted() && self.is_active && !self.is_blocked()
    }
}

/// How much of the account tree an actor is allowed to see.
///
/// Derived from the actor's role and visibility grant; explicit query
/// filters only ever narrow this further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// MASTER: every account, masters included
    All,
    /// ADMIN holding the can_view_admins grant: users and admins,
    /// never masters
    UsersAndAdmins,
    /// Plain ADMIN: user accounts only
    UsersOnly,
    /// USER: nothing but their own record
    SelfOnly(Uuid),
}

impl VisibilityScope {
    pub fn for_actor(actor: &User) -> Self {
        match actor.role {
            Role::Master => VisibilityScope::All,
            Role::Admin if actor.can_view_admins => VisibilityScope::UsersAndAdmins,
            Role::Admin => VisibilityScope::UsersOnly,
            Role::User => VisibilityScope::SelfOnly(actor.id),
        }
    }
}

/// Optional refinements applied on top of a visibility scope.
#[derive(Debug, Clone, Default)]
pub struct UserFilters {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub blocked: Option<bool>,
    pub can_view_admins: Option<bool>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// User email address
    #[schema(example = "driver@example.com")]
    pub email: String,
    /// Unique login name
    #[schema(example = "driver42")]
    pub username: String,
    /// User display name
    #[schema(example = "John Doe")]
    pub name: String,
    /// Account role
    #[schema(example = "USER")]
    pub role: Role,
    /// Whether the account may authenticate
    pub is_active: bool,
    /// When the account was blocked, if it is
    pub blocked_at: Option<DateTime<Utc>>,
    /// ADMIN accounts only: whether listings include other admins
    pub can_view_admins: bool,
    /// Whether the account still has to complete its admin profile
    pub requires_complete_profile: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            name: user.name,
            role: user.role,
            is_active: user.is_active,
            blocked_at: user.blocked_at,
            can_view_admins: user.can_view_admins,
            requires_complete_profile: user.requires_complete_profile,
            created_at: user.created_at,
        }
    }
}
