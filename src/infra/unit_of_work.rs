//! Unit of Work pattern implementation.
//!
//! SOLID (SRP): Manages transaction lifecycle and repository access.
//! DDD: Coordinates operations across multiple aggregates atomically.
//!
//! The Unit of Work pattern:
//! - Centralizes access to all repositories
//! - Manages database transactions (begin, commit, rollback)
//! - Ensures consistency across multiple repository operations
//!
//! The hierarchy operations depend on this: a privileged mutation and
//! its audit entry commit together or not at all, with the target row
//! held under an exclusive lock in between.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::repositories::entities::user::{self, ActiveModel, Entity as UserEntity};
use super::repositories::{
    build_entry, AuditLogRepository, AuditLogStore, UserRepository, UserStore,
};
use crate::domain::{AuditEntry, AuditEvent, RequestContext, User};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Provides centralized access to all repositories and transaction management.
/// Note: This trait is not mockable directly due to generic methods.
/// For testing, mock at the repository level or use integration tests.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get audit log repository
    fn audit_logs(&self) -> Arc<dyn AuditLogRepository>;

    /// Execute a closure within a transaction.
    ///
    /// The transaction is automatically committed on success or rolled back on error.
    /// Uses ReadCommitted isolation level; operations that need stronger
    /// guarantees take row locks through the transactional repositories.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
///
/// All repository operations performed through this context are part
/// of the same database transaction. The context borrows the transaction
/// to ensure proper lifetime management.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    /// Create a new transaction context
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Get user repository for this transaction
    pub fn users(&self) -> TxUserRepository<'_> {
        TxUserRepository::new(self.txn)
    }

    /// Get audit log repository for this transaction
    pub fn audit_logs(&self) -> TxAuditLogRepository<'_> {
        TxAuditLogRepository::new(self.txn)
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    audit_repo: Arc<AuditLogStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let user_repo = Arc::new(UserStore::new(db.clone()));
        let audit_repo = Arc::new(AuditLogStore::new(db.clone()));
        Self {
            db,
            user_repo,
            audit_repo,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn audit_logs(&self) -> Arc<dyn AuditLogRepository> {
        self.audit_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        // Begin transaction
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        // Create context with borrowed transaction
        let ctx = TransactionContext::new(&txn);

        // Execute the closure
        match f(ctx).await {
            Ok(result) => {
                // Commit on success - txn is owned, so this always works
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                // Rollback on error
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Transaction-aware user repository.
///
/// Executes all operations within the provided transaction. The
/// mutators here are the only code paths that change role, block or
/// visibility state; each caller pairs them with an audit insert on
/// the same transaction.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    /// Create new transaction-aware repository
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Find user by ID, taking an exclusive row lock (SELECT ... FOR UPDATE).
    ///
    /// Concurrent privileged operations on the same account serialize on
    /// this lock until the surrounding transaction commits or rolls back.
    pub async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(self.txn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn fetch_active(&self, id: Uuid) -> AppResult<ActiveModel> {
        let model = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(self.txn)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(model.into())
    }

    /// Raise the account to ADMIN and open its profile requirement
    pub async fn promote(&self, id: Uuid, actor_id: Uuid) -> AppResult<User> {
        let mut active = self.fetch_active(id).await?;

        active.role = Set(user::Role::Admin);
        active.promoted_by = Set(Some(actor_id));
        active.requires_complete_profile = Set(true);
        active.profile_completed_at = Set(None);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.txn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    /// Return the account to USER, dropping the admin visibility grant
    pub async fn demote(&self, id: Uuid, actor_id: Uuid) -> AppResult<User> {
        let mut active = self.fetch_active(id).await?;
        let now = Utc::now();

        active.role = Set(user::Role::User);
        active.demoted_by = Set(Some(actor_id));
        active.demoted_at = Set(Some(now));
        active.can_view_admins = Set(false);
        active.requires_complete_profile = Set(false);
        active.profile_completed_at = Set(None);
        active.updated_at = Set(now);

        let model = active.update(self.txn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    /// Grant or revoke the admin visibility flag
    pub async fn set_admin_visibility(&self, id: Uuid, can_view: bool) -> AppResult<User> {
        let mut active = self.fetch_active(id).await?;

        active.can_view_admins = Set(can_view);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.txn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    /// Block the account. A blocked account is also deactivated.
    pub async fn block(&self, id: Uuid, actor_id: Uuid) -> AppResult<User> {
        let mut active = self.fetch_active(id).await?;
        let now = Utc::now();

        active.blocked_at = Set(Some(now));
        active.blocked_by = Set(Some(actor_id));
        active.is_active = Set(false);
        active.updated_at = Set(now);

        let model = active.update(self.txn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    /// Lift a block and restore the account to active
    pub async fn unblock(&self, id: Uuid) -> AppResult<User> {
        let mut active = self.fetch_active(id).await?;

        active.blocked_at = Set(None);
        active.blocked_by = Set(None);
        active.is_active = Set(true);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.txn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    /// Enable or disable the account without touching block state
    pub async fn set_active(&self, id: Uuid, active_flag: bool) -> AppResult<User> {
        let mut active = self.fetch_active(id).await?;

        active.is_active = Set(active_flag);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.txn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    /// Soft delete the account (sets deleted_at timestamp)
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<()> {
        let mut active = self.fetch_active(id).await?;
        let now = Utc::now();

        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);

        active.update(self.txn).await.map_err(AppError::from)?;
        Ok(())
    }
}

/// Transaction-aware audit log repository.
pub struct TxAuditLogRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxAuditLogRepository<'a> {
    /// Create new transaction-aware repository
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Persist one entry inside the transaction
    pub async fn insert(&self, event: AuditEvent, ctx: RequestContext) -> AppResult<AuditEntry> {
        let model = build_entry(event, ctx)
            .insert(self.txn)
            .await
            .map_err(AppError::from)?;

        Ok(AuditEntry::from(model))
    }
}
