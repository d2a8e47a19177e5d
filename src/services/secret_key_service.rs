//! Secret key service - MASTER account recovery credentials.
//!
//! SOLID (SRP): Key lifecycle only. The service writes no audit entries
//! itself; HTTP handlers pair each call with the matching audit record.
//!
//! Failure policy: anything that can hit a missing, malformed or expired
//! credential fails closed. Outward-facing reset failures collapse to a
//! single `InvalidRecoveryKey` so a caller cannot tell a wrong key from
//! a missing or expired one.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{secret_code, Password, SecretCode, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// Secret key service trait for dependency injection.
#[async_trait]
pub trait SecretKeyService: Send + Sync {
    /// Generate and store a fresh recovery key for a MASTER account,
    /// returning the plaintext exactly once. Overwrites any previous key
    /// and clears its usage mark.
    async fn issue_for_master(&self, actor: &User) -> AppResult<String>;

    /// Look up a MASTER account by username and check the key against
    /// it. Returns `None` on any failure: unknown username, wrong role,
    /// no key stored, mismatch, or expiry. Side-effect free.
    async fn validate_for_reset(&self, username: &str, plaintext: &str)
        -> AppResult<Option<User>>;

    /// Stamp the key as used. Clears the hash only when the single-use
    /// policy flag is enabled.
    async fn mark_used(&self, user_id: Uuid) -> AppResult<User>;

    /// Drop all recovery key material from the account
    async fn revoke(&self, actor: &User) -> AppResult<User>;

    /// Whether the account currently holds an unexpired key
    async fn has_valid_key(&self, user_id: Uuid) -> AppResult<bool>;

    /// The full recovery flow: validate the key, replace the password,
    /// mark the key used. Every failure surfaces as the same generic
    /// invalid-or-expired error.
    async fn reset_password(
        &self,
        username: &str,
        plaintext: &str,
        new_password: &str,
    ) -> AppResult<User>;
}

/// Concrete implementation of SecretKeyService using Unit of Work.
pub struct SecretKeyManager<U: UnitOfWork> {
    uow: Arc<U>,
    /// When true, `mark_used` also clears the hash (true single use).
    /// Default false: the key stays valid until its 90-day expiry.
    single_use: bool,
}

impl<U: UnitOfWork> SecretKeyManager<U> {
    /// Create new secret key service instance with Unit of Work
    pub fn new(uow: Arc<U>, single_use: bool) -> Self {
        Self { uow, single_use }
    }
}

#[async_trait]
impl<U: UnitOfWork> SecretKeyService for SecretKeyManager<U> {
    async fn issue_for_master(&self, actor: &User) -> AppResult<String> {
        if !actor.role.is_master() {
            return Err(AppError::forbidden(
                "only a MASTER account may hold a recovery key",
            ));
        }

        let plaintext = SecretCode::generate();
        let hash = SecretCode::new(&plaintext)?.as_str().to_string();

        // The repository stamps created_at and clears used_at; only the
        // hash ever reaches storage.
        self.uow.users().store_secret_key(actor.id, hash).await?;

        Ok(plaintext)
    }

    async fn validate_for_reset(
        &self,
        username: &str,
        plaintext: &str,
    ) -> AppResult<Option<User>> {
        let Some(user) = self.uow.users().find_by_username(username).await? else {
            return Ok(None);
        };
        if !user.role.is_master() {
            return Ok(None);
        }
        let (Some(hash), Some(created_at)) =
            (user.secret_key_hash.clone(), user.secret_key_created_at)
        else {
            return Ok(None);
        };
        if secret_code::is_expired(created_at, Utc::now()) {
            return Ok(None);
        }
        if !SecretCode::from_hash(hash).verify(plaintext) {
            return Ok(None);
        }

        Ok(Some(user))
    }

    async fn mark_used(&self, user_id: Uuid) -> AppResult<User> {
        self.uow
            .users()
            .mark_secret_key_used(user_id, self.single_use)
            .await
    }

    async fn revoke(&self, actor: &User) -> AppResult<User> {
        if !actor.role.is_master() {
            return Err(AppError::forbidden(
                "only a MASTER account may hold a recovery key",
            ));
        }
        self.uow.users().clear_secret_key(actor.id).await
    }

    async fn has_valid_key(&self, user_id: Uuid) -> AppResult<bool> {
        let Some(user) = self.uow.users().find_by_id(user_id).await? else {
            return Ok(false);
        };
        Ok(match (user.secret_key_hash, user.secret_key_created_at) {
            (Some(_), Some(created_at)) => !secret_code::is_expired(created_at, Utc::now()),
            _ => false,
        })
    }

    async fn reset_password(
        &self,
        username: &str,
        plaintext: &str,
        new_password: &str,
    ) -> AppResult<User> {
        let user = self
            .validate_for_reset(username, plaintext)
            .await?
            .ok_or(AppError::InvalidRecoveryKey)?;

        // Password policy violations (too short) are a caller mistake,
        // not a credential failure, and keep their own message.
        let password_hash = Password::new(new_password)?.into_string();
        self.uow
            .users()
            .update_password(user.id, password_hash)
            .await?;

        self.mark_used(user.id).await
    }
}
