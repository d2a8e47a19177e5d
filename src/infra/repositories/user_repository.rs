//! User repository implementation with soft delete support.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{Role, User, UserFilters, VisibilityScope};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// All query methods exclude soft-deleted records.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by email including soft-deleted (for uniqueness checks)
    async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by login name
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find user by login name including soft-deleted (for uniqueness checks)
    async fn find_by_username_with_deleted(&self, username: &str) -> AppResult<Option<User>>;

    /// Create a new account with the default USER role
    async fn create(
        &self,
        email: String,
        username: String,
        password_hash: String,
        name: String,
    ) -> AppResult<User>;

    /// Create a MASTER account. Bootstrap only; role changes afterwards
    /// go through the hierarchy operations.
    async fn create_master(
        &self,
        email: String,
        username: String,
        password_hash: String,
        name: String,
    ) -> AppResult<User>;

    /// List accounts inside a visibility scope, newest first
    async fn list_scoped(
        &self,
        scope: VisibilityScope,
        filters: UserFilters,
        pagination: PaginationParams,
    ) -> AppResult<(Vec<User>, u64)>;

    /// Replace the stored password hash
    async fn update_password(&self, id: Uuid, password_hash: String) -> AppResult<User>;

    /// Store a fresh recovery key hash, stamping its creation time and
    /// clearing any previous usage mark
    async fn store_secret_key(&self, id: Uuid, hash: String) -> AppResult<User>;

    /// Stamp the recovery key as used, optionally clearing the hash
    async fn mark_secret_key_used(&self, id: Uuid, clear_hash: bool) -> AppResult<User>;

    /// Drop all recovery key material
    async fn clear_secret_key(&self, id: Uuid) -> AppResult<User>;

    /// Mark the admin profile as completed, optionally updating the name
    async fn complete_profile(&self, id: Uuid, name: Option<String>) -> AppResult<User>;
}

/// Concrete implementation of UserRepository with soft delete
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Build the scoped, filtered, ordered listing query.
    ///
    /// The scope bounds what is reachable; filters only narrow within it.
    fn scoped_query(scope: VisibilityScope, filters: &UserFilters) -> Select<UserEntity> {
        let mut query = UserEntity::find().filter(user::Column::DeletedAt.is_null());

        query = match scope {
            VisibilityScope::All => query,
            VisibilityScope::UsersAndAdmins => query.filter(
                user::Column::Role.is_in([user::Role::User, user::Role::Admin]),
            ),
            VisibilityScope::UsersOnly => query.filter(user::Column::Role.eq(user::Role::User)),
            VisibilityScope::SelfOnly(id) => query.filter(user::Column::Id.eq(id)),
        };

        if let Some(role) = filters.role {
            query = query.filter(user::Column::Role.eq(user::Role::from(role)));
        }
        if let Some(active) = filters.is_active {
            query = query.filter(user::Column::IsActive.eq(active));
        }
        if let Some(blocked) = filters.blocked {
            query = if blocked {
                query.filter(user::Column::BlockedAt.is_not_null())
            } else {
                query.filter(user::Column::BlockedAt.is_null())
            };
        }
        if let Some(grant) = filters.can_view_admins {
            query = query.filter(user::Column::CanViewAdmins.eq(grant));
        }

        query.order_by_desc(user::Column::CreatedAt)
    }

    async fn insert_account(
        &self,
        email: String,
        username: String,
        password_hash: String,
        name: String,
        role: Role,
    ) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            username: Set(username),
            password_hash: Set(password_hash),
            name: Set(name),
            role: Set(role.into()),
            is_active: Set(true),
            blocked_at: Set(None),
            blocked_by: Set(None),
            can_view_admins: Set(false),
            promoted_by: Set(None),
            demoted_by: Set(None),
            demoted_at: Set(None),
            secret_key_hash: Set(None),
            secret_key_created_at: Set(None),
            secret_key_used_at: Set(None),
            requires_complete_profile: Set(false),
            profile_completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn fetch_active_model(&self, id: Uuid) -> AppResult<ActiveModel> {
        let model = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(model.into())
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_username_with_deleted(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn create(
        &self,
        email: String,
        username: String,
        password_hash: String,
        name: String,
    ) -> AppResult<User> {
        self.insert_account(email, username, password_hash, name, Role::User)
            .await
    }

    async fn create_master(
        &self,
        email: String,
        username: String,
        password_hash: String,
        name: String,
    ) -> AppResult<User> {
        self.insert_account(email, username, password_hash, name, Role::Master)
            .await
    }

    async fn list_scoped(
        &self,
        scope: VisibilityScope,
        filters: UserFilters,
        pagination: PaginationParams,
    ) -> AppResult<(Vec<User>, u64)> {
        let paginator =
            Self::scoped_query(scope, &filters).paginate(&self.db, pagination.limit());

        let total = paginator.num_items().await?;
        let models = paginator
            .fetch_page(pagination.page.saturating_sub(1))
            .await?;

        Ok((models.into_iter().map(User::from).collect(), total))
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> AppResult<User> {
        let mut active = self.fetch_active_model(id).await?;

        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn store_secret_key(&self, id: Uuid, hash: String) -> AppResult<User> {
        let mut active = self.fetch_active_model(id).await?;
        let now = Utc::now();

        active.secret_key_hash = Set(Some(hash));
        active.secret_key_created_at = Set(Some(now));
        active.secret_key_used_at = Set(None);
        active.updated_at = Set(now);

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn mark_secret_key_used(&self, id: Uuid, clear_hash: bool) -> AppResult<User> {
        let mut active = self.fetch_active_model(id).await?;
        let now = Utc::now();

        active.secret_key_used_at = Set(Some(now));
        if clear_hash {
            active.secret_key_hash = Set(None);
        }
        active.updated_at = Set(now);

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn clear_secret_key(&self, id: Uuid) -> AppResult<User> {
        let mut active = self.fetch_active_model(id).await?;

        active.secret_key_hash = Set(None);
        active.secret_key_created_at = Set(None);
        active.secret_key_used_at = Set(None);
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn complete_profile(&self, id: Uuid, name: Option<String>) -> AppResult<User> {
        let mut active = self.fetch_active_model(id).await?;
        let now = Utc::now();

        if let Some(name) = name {
            active.name = Set(name);
        }
        active.requires_complete_profile = Set(false);
        active.profile_completed_at = Set(Some(now));
        active.updated_at = Set(now);

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }
}
