//! Hierarchy service - Role transitions, visibility and block state.
//!
//! SOLID (SRP): Owns the privileged account transitions. Eligibility
//! rules live in `domain::policy`; this service sequences
//! gate -> mutate -> audit inside a single transaction.
//!
//! Every mutating operation re-fetches the target row with a `FOR UPDATE`
//! lock, so concurrent privileged operations on the same account
//! serialize, and commits the row change together with its audit entry.
//! A failed gate writes nothing.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::audit::actions;
use crate::domain::{
    AuditEvent, MasterPolicy, RequestContext, Role, User, UserFilters, VisibilityScope,
};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::types::PaginationParams;

/// Hierarchy service trait for dependency injection.
#[async_trait]
pub trait HierarchyService: Send + Sync {
    /// List the accounts the actor is allowed to see, newest first.
    /// Explicit filters only narrow the hierarchy scope, never widen it.
    async fn get_visible_users(
        &self,
        actor: &User,
        filters: UserFilters,
        pagination: PaginationParams,
    ) -> AppResult<(Vec<User>, u64)>;

    /// Raise a USER account to ADMIN. MASTER actors only.
    async fn promote_to_admin(
        &self,
        actor: &User,
        target_id: Uuid,
        reason: Option<String>,
        ctx: RequestContext,
    ) -> AppResult<User>;

    /// Return an ADMIN account to USER. MASTER actors only.
    async fn demote_to_user(
        &self,
        actor: &User,
        target_id: Uuid,
        reason: Option<String>,
        ctx: RequestContext,
    ) -> AppResult<User>;

    /// Grant or revoke an ADMIN's visibility into other admins
    async fn toggle_admin_visibility(
        &self,
        actor: &User,
        target_id: Uuid,
        can_view: bool,
        ctx: RequestContext,
    ) -> AppResult<User>;

    /// Block an account, deactivating it
    async fn block(
        &self,
        actor: &User,
        target_id: Uuid,
        reason: Option<String>,
        ctx: RequestContext,
    ) -> AppResult<User>;

    /// Lift a block, restoring the account to active
    async fn unblock(&self, actor: &User, target_id: Uuid, ctx: RequestContext)
        -> AppResult<User>;
}

/// Management standing: may `manager` block/unblock `target`?
///
/// MASTER manages everyone except *other* MASTER accounts (itself is
/// fine); ADMIN manages plain USER targets only; USER manages nobody.
pub fn can_manage(manager: &User, target: &User) -> bool {
    match manager.role {
        Role::Master => !target.role.is_master() || target.id == manager.id,
        Role::Admin => target.role == Role::User,
        Role::User => false,
    }
}

/// Gate for promotion: MASTER actor, USER target.
fn check_promote(actor: &User, target: &User) -> AppResult<()> {
    if !actor.role.is_master() {
        return Err(AppError::forbidden("only a MASTER may promote accounts"));
    }
    if target.role != Role::User {
        return Err(AppError::invalid_state(
            "only a USER account can be promoted to ADMIN",
        ));
    }
    Ok(())
}

/// Gate for demotion: MASTER actor, ADMIN target.
fn check_demote(actor: &User, target: &User) -> AppResult<()> {
    if !actor.role.is_master() {
        return Err(AppError::forbidden("only a MASTER may demote accounts"));
    }
    if target.role != Role::Admin {
        return Err(AppError::invalid_state(
            "only an ADMIN account can be demoted to USER",
        ));
    }
    Ok(())
}

/// Gate for the visibility toggle: MASTER actor, ADMIN target.
fn check_toggle_visibility(actor: &User, target: &User) -> AppResult<()> {
    if !actor.role.is_master() {
        return Err(AppError::forbidden(
            "only a MASTER may change admin visibility",
        ));
    }
    if target.role != Role::Admin {
        return Err(AppError::invalid_state(
            "admin visibility applies only to ADMIN accounts",
        ));
    }
    Ok(())
}

/// Gate for blocking: standing, not-already-blocked, then the
/// protection policy ladder.
fn check_block(policy: &MasterPolicy, actor: &User, target: &User) -> AppResult<()> {
    if !can_manage(actor, target) {
        return Err(AppError::forbidden("you cannot manage this account"));
    }
    if target.is_blocked() {
        return Err(AppError::invalid_state("account is already blocked"));
    }
    policy.can_block(target, actor).into_result()
}

/// Gate for unblocking: standing plus currently-blocked.
fn check_unblock(actor: &User, target: &User) -> AppResult<()> {
    if !can_manage(actor, target) {
        return Err(AppError::forbidden("you cannot manage this account"));
    }
    if !target.is_blocked() {
        return Err(AppError::invalid_state("account is not blocked"));
    }
    Ok(())
}

/// Concrete implementation of HierarchyService using Unit of Work.
pub struct HierarchyManager<U: UnitOfWork> {
    uow: Arc<U>,
    policy: MasterPolicy,
}

impl<U: UnitOfWork> HierarchyManager<U> {
    /// Create new hierarchy service instance with Unit of Work
    pub fn new(uow: Arc<U>, policy: MasterPolicy) -> Self {
        Self { uow, policy }
    }
}

#[async_trait]
impl<U: UnitOfWork> HierarchyService for HierarchyManager<U> {
    async fn get_visible_users(
        &self,
        actor: &User,
        filters: UserFilters,
        pagination: PaginationParams,
    ) -> AppResult<(Vec<User>, u64)> {
        let scope = VisibilityScope::for_actor(actor);
        self.uow.users().list_scoped(scope, filters, pagination).await
    }

    async fn promote_to_admin(
        &self,
        actor: &User,
        target_id: Uuid,
        reason: Option<String>,
        ctx: RequestContext,
    ) -> AppResult<User> {
        let actor = actor.clone();
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let target = tx
                        .users()
                        .find_by_id_for_update(target_id)
                        .await?
                        .ok_or(AppError::NotFound)?;

                    check_promote(&actor, &target)?;

                    let from_role = target.role;
                    let promoted = tx.users().promote(target_id, actor.id).await?;

                    let event = AuditEvent::user_action(
                        actions::PROMOTE_TO_ADMIN,
                        &promoted,
                        &actor,
                        format!("Promoted {} to ADMIN", promoted.email),
                        Some(serde_json::json!({
                            "from_role": from_role,
                            "to_role": promoted.role,
                            "reason": reason,
                        })),
                    );
                    tx.audit_logs().insert(event, ctx).await?;

                    Ok(promoted)
                })
            })
            .await
    }

    async fn demote_to_user(
        &self,
        actor: &User,
        target_id: Uuid,
        reason: Option<String>,
        ctx: RequestContext,
    ) -> AppResult<User> {
        let actor = actor.clone();
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let target = tx
                        .users()
                        .find_by_id_for_update(target_id)
                        .await?
                        .ok_or(AppError::NotFound)?;

                    check_demote(&actor, &target)?;

                    let from_role = target.role;
                    let demoted = tx.users().demote(target_id, actor.id).await?;

                    let event = AuditEvent::user_action(
                        actions::DEMOTE_TO_USER,
                        &demoted,
                        &actor,
                        format!("Demoted {} to USER", demoted.email),
                        Some(serde_json::json!({
                            "from_role": from_role,
                            "to_role": demoted.role,
                            "reason": reason,
                        })),
                    );
                    tx.audit_logs().insert(event, ctx).await?;

                    Ok(demoted)
                })
            })
            .await
    }

    async fn toggle_admin_visibility(
        &self,
        actor: &User,
        target_id: Uuid,
        can_view: bool,
        ctx: RequestContext,
    ) -> AppResult<User> {
        let actor = actor.clone();
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let target = tx
                        .users()
                        .find_by_id_for_update(target_id)
                        .await?
                        .ok_or(AppError::NotFound)?;

                    check_toggle_visibility(&actor, &target)?;

                    let updated = tx.users().set_admin_visibility(target_id, can_view).await?;

                    let description = if can_view {
                        format!("Granted {} visibility into other admins", updated.email)
                    } else {
                        format!("Revoked admin visibility from {}", updated.email)
                    };
                    let event = AuditEvent::user_action(
                        actions::TOGGLE_ADMIN_VISIBILITY,
                        &updated,
                        &actor,
                        description,
                        Some(serde_json::json!({ "can_view_admins": can_view })),
                    );
                    tx.audit_logs().insert(event, ctx).await?;

                    Ok(updated)
                })
            })
            .await
    }

    async fn block(
        &self,
        actor: &User,
        target_id: Uuid,
        reason: Option<String>,
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

                    check_block(&policy, &actor, &target)?;

                    let blocked = tx.users().block(target_id, actor.id).await?;

                    let event = AuditEvent::user_action(
                        actions::BLOCK_USER,
                        &blocked,
                        &actor,
                        format!("Blocked account {}", blocked.email),
                        Some(serde_json::json!({
                            "reason": reason,
                            "blocked_at": blocked.blocked_at,
                        })),
                    );
                    tx.audit_logs().insert(event, ctx).await?;

                    Ok(blocked)
                })
            })
            .await
    }

    async fn unblock(
        &self,
        actor: &User,
        target_id: Uuid,
        ctx: RequestContext,
    ) -> AppResult<User> {
        let actor = actor.clone();
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let target = tx
                        .users()
                        .find_by_id_for_update(target_id)
                        .await?
                        .ok_or(AppError::NotFound)?;

                    check_unblock(&actor, &target)?;

                    let unblocked = tx.users().unblock(target_id).await?;

                    let event = AuditEvent::user_action(
                        actions::UNBLOCK_USER,
                        &unblocked,
                        &actor,
                        format!("Unblocked account {}", unblocked.email),
                        None,
                    );
                    tx.audit_logs().insert(event, ctx).await?;

                    Ok(unblocked)
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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

    fn policy() -> MasterPolicy {
        MasterPolicy::new(Some("founder@gigbooks.dev".to_string()))
    }

    #[test]
    fn test_master_manages_everyone_but_other_masters() {
        let master = account(Role::Master, "m@gigbooks.dev");
        let other_master = account(Role::Master, "m2@gigbooks.dev");
        let admin = account(Role::Admin, "a@gigbooks.dev");
        let user = account(Role::User, "u@gigbooks.dev");

        assert!(can_manage(&master, &admin));
        assert!(can_manage(&master, &user));
        assert!(can_manage(&master, &master));
        assert!(!can_manage(&master, &other_master));
    }

    #[test]
    fn test_admin_manages_only_plain_users() {
        let admin = account(Role::Admin, "a@gigbooks.dev");
        let other_admin = account(Role::Admin, "a2@gigbooks.dev");
        let master = account(Role::Master, "m@gigbooks.dev");
        let user = account(Role::User, "u@gigbooks.dev");

        assert!(can_manage(&admin, &user));
        assert!(!can_manage(&admin, &other_admin));
        assert!(!can_manage(&admin, &master));
    }

    #[test]
    fn test_user_manages_nobody() {
        let user = account(Role::User, "u@gigbooks.dev");
        let other = account(Role::User, "u2@gigbooks.dev");

        assert!(!can_manage(&user, &other));
        assert!(!can_manage(&user, &user));
    }

    #[test]
    fn test_promote_requires_master_actor() {
        let target = account(Role::User, "u@gigbooks.dev");

        for role in [Role::Admin, Role::User] {
            let actor = account(role, "actor@gigbooks.dev");
            let err = check_promote(&actor, &target).unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
    }

    #[test]
    fn test_promote_rejects_non_user_targets() {
        let master = account(Role::Master, "m@gigbooks.dev");

        // Already ADMIN or MASTER: InvalidState, never a mutation
        for role in [Role::Admin, Role::Master] {
            let target = account(role, "t@gigbooks.dev");
            let err = check_promote(&master, &target).unwrap_err();
            assert!(matches!(err, AppError::InvalidState(_)));
        }
    }

    #[test]
    fn test_demote_requires_admin_target() {
        let master = account(Role::Master, "m@gigbooks.dev");

        let admin = account(Role::Admin, "a@gigbooks.dev");
        assert!(check_demote(&master, &admin).is_ok());

        for role in [Role::User, Role::Master] {
            let target = account(role, "t@gigbooks.dev");
            let err = check_demote(&master, &target).unwrap_err();
            assert!(matches!(err, AppError::InvalidState(_)));
        }
    }

    #[test]
    fn test_visibility_toggle_gates() {
        let master = account(Role::Master, "m@gigbooks.dev");
        let admin = account(Role::Admin, "a@gigbooks.dev");
        let user = account(Role::User, "u@gigbooks.dev");

        assert!(check_toggle_visibility(&master, &admin).is_ok());
        assert!(matches!(
            check_toggle_visibility(&master, &user).unwrap_err(),
            AppError::InvalidState(_)
        ));
        assert!(matches!(
            check_toggle_visibility(&admin, &admin).unwrap_err(),
            AppError::Forbidden(_)
        ));
    }

    #[test]
    fn test_admin_cannot_block_another_admin() {
        let actor = account(Role::Admin, "a1@gigbooks.dev");
        let target = account(Role::Admin, "a2@gigbooks.dev");

        // Fails the standing gate before the policy ladder is consulted
        let err = check_block(&policy(), &actor, &target).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_block_rejects_already_blocked_target() {
        let master = account(Role::Master, "m@gigbooks.dev");
        let mut target = account(Role::User, "u@gigbooks.dev");
        target.blocked_at = Some(Utc::now());

        let err = check_block(&policy(), &master, &target).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn test_block_surfaces_policy_reason() {
        // Self-block passes the standing gate, so the original master
        // blocking itself reaches the policy ladder and is denied there.
        let original = account(Role::Master, "founder@gigbooks.dev");

        let err = check_block(&policy(), &original, &original).unwrap_err();
        assert!(
            matches!(err, AppError::Forbidden(reason) if reason.contains("original master"))
        );
    }

    #[test]
    fn test_unblock_requires_blocked_target() {
        let master = account(Role::Master, "m@gigbooks.dev");
        let target = account(Role::User, "u@gigbooks.dev");

        let err = check_unblock(&master, &target).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let mut blocked = account(Role::User, "b@gigbooks.dev");
        blocked.blocked_at = Some(Utc::now());
        assert!(check_unblock(&master, &blocked).is_ok());
    }
}
