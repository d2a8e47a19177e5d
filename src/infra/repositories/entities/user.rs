//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{self, User};

/// Role column values, stored as the exact uppercase strings.
///
/// Decoding a row with any other value fails at the ORM layer instead
/// of defaulting to some role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    #[sea_orm(string_value = "MASTER")]
    Master,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "USER")]
    User,
}

impl From<Role> for domain::Role {
    fn from(role: Role) -> Self {
        match role {
            Role::Master => domain::Role::Master,
            Role::Admin => domain::Role::Admin,
            Role::User => domain::Role::User,
        }
    }
}

impl From<domain::Role> for Role {
    fn from(role: domain::Role) -> Self {
        match role {
            domain::Role::Master => Role::Master,
            domain::Role::Admin => Role::Admin,
            domain::Role::User => Role::User,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub blocked_at: Option<DateTimeUtc>,
    pub blocked_by: Option<Uuid>,
    pub can_view_admins: bool,
    pub promoted_by: Option<Uuid>,
    pub demoted_by: Option<Uuid>,
    pub demoted_at: Option<DateTimeUtc>,
    pub secret_key_hash: Option<String>,
    pub secret_key_created_at: Option<DateTimeUtc>,
    pub secret_key_used_at: Option<DateTimeUtc>,
    pub requires_complete_profile: bool,
    pub profile_completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Soft delete timestamp (NULL = present, set = deleted)
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            username: model.username,
            password_hash: model.password_hash,
            name: model.name,
            role: model.role.into(),
            is_active: model.is_active,
            blocked_at: model.blocked_at,
            blocked_by: model.blocked_by,
            can_view_admins: model.can_view_admins,
            promoted_by: model.promoted_by,
            demoted_by: model.demoted_by,
            demoted_at: model.demoted_at,
            secret_key_hash: model.secret_key_hash,
            secret_key_created_at: model.secret_key_created_at,
            secret_key_used_at: model.secret_key_used_at,
            requires_complete_profile: model.requires_complete_profile,
            profile_completed_at: model.profile_completed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        }
    }
}
