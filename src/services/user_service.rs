//! User service - Account-level operations outside the role hierarchy.
//!
//! SOLID (SRP): Profile access plus the disable/enable and delete
//! executors. Eligibility comes from `MasterPolicy`; like the hierarchy
//! operations, each mutation commits together with its audit entry
//! under a row lock on the target.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::audit::actions;
use crate::domain::{AuditEvent, MasterPolicy, RequestContext, Role, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get active user by ID (excludes soft-deleted)
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Mark the actor's admin profile as completed, optionally updating
    /// the display name
    async fn complete_profile(
        &self,
        actor: &User,
        name: Option<String>,
        ctx: RequestContext,
    ) -> AppResult<User>;

    /// Disable or re-enable an account. Disabling is gated by the
    /// protection policy; self-disable is deliberately permitted.
    async fn set_active(
        &self,
        actor: &User,
        target_id: Uuid,
        active: bool,
        ctx: RequestContext,
    ) -> AppResult<User>;

    /// Soft delete an account, gated by the protection policy
    async fn delete_user(
        &self,
        actor: &User,
        target_id: Uuid,
        ctx: RequestContext,
    ) -> AppResult<()>;
}

/// Actor standing for disable/enable/delete: acting on yourself is
/// always in standing (the policy ladder still applies); otherwise a
/// MASTER stands over everyone and an ADMIN only over USER targets.
/// The check is direction-agnostic: the policy ladder only guards the
/// destructive direction, so standing alone keeps an ADMIN from
/// re-enabling an account above their tier.
fn check_standing(actor: &User, target: &User) -> AppResult<()> {
    if actor.id == target.id {
        return Ok(());
    }
    match actor.role {
        Role::Master => Ok(()),
        Role::Admin if target.role == Role::User => Ok(()),
        _ => Err(AppError::forbidden("you cannot manage this account")),
    }
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    policy: MasterPolicy,
}

impl<U: UnitOfWork> UserManager<U> {
    /// Create new user service instance with Unit of Work
    pub fn new(uow: Arc<U>, policy: MasterPolicy) -> Self {
        Self { uow, policy }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow
            .users()
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn complete_profile(
        &self,
        actor: &User,
        name: Option<String>,
        ctx: RequestContext,
    ) -> AppResult<User> {
        if !actor.requires_complete_profile {
            return Err(AppError::invalid_state(
                "profile is not pending completion",
            ));
        }

        let updated = self.uow.users().complete_profile(actor.id, name).await?;

        let event = AuditEvent::user_action(
            actions::COMPLETE_PROFILE,
            &updated,
            actor,
            format!("Completed admin profile for {}", updated.email),
            None,
        );
        self.uow.audit_logs().insert(event, ctx).await?;

        Ok(updated)
    }

    async fn set_active(
        &self,
        actor: &User,
        target_id: Uuid,
        active: bool,
        ctx: RequestContext,
    ) -> AppResult<User> {
        let actor = actor.clone();
        let policy = self.policy.clone();
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let target = tx
                        .users()
                        .find_by_id_for_update(target_id)
                        .await?
                        .ok_or(AppError::NotFound)?;

                    check_standing(&actor, &target)?;

                    // The policy ladder guards disabling only; re-enabling
                    // an account is not a destructive operation.
                    if !active {
                        policy.can_disable(&target, &actor).into_result()?;
                    }
                    if target.is_active == active {
                        return Err(AppError::invalid_state(if active {
                            "account is already enabled"
                        } else {
                            "account is already disabled"
                        }));
                    }

                    let updated = tx.users().set_active(target_id, active).await?;

                    let (action, description) = if active {
                        (
                            actions::ENABLE_USER,
                            format!("Enabled account {}", updated.email),
                        )
                    } else {
                        (
                            actions::DISABLE_USER,
                            format!("Disabled account {}", updated.email),
                        )
                    };
                    let event = AuditEvent::user_action(action, &updated, &actor, description, None);
                    tx.audit_logs().insert(event, ctx).await?;

                    Ok(updated)
                })
            })
            .await
    }

    async fn delete_user(
        &self,
        actor: &User,
        target_id: Uuid,
        ctx: RequestContext,
    ) -> AppResult<()> {
        let actor = actor.clone();
        let policy = self.policy.clone();
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let target = tx
                        .users()
                        .find_by_id_for_update(target_id)
                        .await?
                        .ok_or(AppError::NotFound)?;

                    check_standing(&actor, &target)?;
                    policy.can_delete(&target, &actor).into_result()?;

                    tx.users().soft_delete(target_id).await?;

                    let event = AuditEvent::user_action(
                        actions::DELETE_USER,
                        &target,
                        &actor,
                        format!("Deleted account {}", target.email),
                        None,
                    );
                    tx.audit_logs().insert(event, ctx).await?;

                    Ok(())
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(role: Role, email: &str) -> User {
        let mut user = User::new(
            Uuid::new_v4(),
            email.to_string(),
            email.split('@').next().unwrap().to_string(),
            "hash".to_string(),
            "Test Account".to_string(),
        );
        user.role = role;
        user
    }

    #[test]
    fn test_user_has_standing_only_over_self() {
        let user = account(Role::User, "u@gigbooks.dev");
        let other = account(Role::User, "o@gigbooks.dev");

        assert!(check_standing(&user, &user).is_ok());
        assert!(check_standing(&user, &other).is_err());
    }

    #[test]
    fn test_master_stands_over_every_tier() {
        let master = account(Role::Master, "m@gigbooks.dev");

        for role in [Role::Master, Role::Admin, Role::User] {
            let target = account(role, "t@gigbooks.dev");
            assert!(check_standing(&master, &target).is_ok());
        }
    }

    #[test]
    fn test_admin_stands_over_users_only() {
        let admin = account(Role::Admin, "a@gigbooks.dev");
        let user = account(Role::User, "u@gigbooks.dev");

        assert!(check_standing(&admin, &user).is_ok());

        // Covers re-enabling too: the disable policy never runs for
        // active=true, so standing alone must refuse higher tiers
        for role in [Role::Admin, Role::Master] {
            let target = account(role, "t@gigbooks.dev");
            let err = check_standing(&admin, &target).unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
    }

    #[test]
    fn test_self_standing_holds_for_every_role() {
        for role in [Role::Master, Role::Admin, Role::User] {
            let actor = account(role, "self@gigbooks.dev");
            assert!(check_standing(&actor, &actor).is_ok());
        }
    }
}
