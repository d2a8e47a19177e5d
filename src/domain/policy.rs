//! Master protection policy - account protection rules.
//!
//! DDD: Domain service. Pure decisions over user snapshots, no I/O.
//! Callers load both rows, ask the policy, then act on the answer.

use crate::errors::{AppError, AppResult};

use super::user::User;

/// Outcome of a protection check.
///
/// A denial is ordinary data, not an error: services decide whether to
/// surface it as `Forbidden`, skip the target, or report it in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny(&'static str),
}

impl PolicyDecision {
    fn deny(reason: &'static str) -> Self {
        PolicyDecision::Deny(reason)
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }

    /// Reason string, if this is a denial
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            PolicyDecision::Allow => None,
            PolicyDecision::Deny(reason) => Some(reason),
        }
    }

    /// Convert a denial into `AppError::Forbidden` carrying the reason.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(reason) => Err(AppError::forbidden(reason)),
        }
    }
}

/// Protection rules around destructive account operations.
///
/// The recovery email designates the one "original master" account that
/// no actor may delete, disable or block. It is injected at construction;
/// `None` means no account enjoys that protection.
#[derive(Debug, Clone)]
pub struct MasterPolicy {
    recovery_email: Option<String>,
}

impl MasterPolicy {
    pub fn new(recovery_email: Option<String>) -> Self {
        Self { recovery_email }
    }

    /// Check whether `user` is the original master: MASTER role and an
    /// email exactly equal to the configured recovery email.
    pub fn is_original_master(&self, user: &User) -> bool {
        match &self.recovery_email {
            Some(email) if !email.is_empty() => user.role.is_master() && user.email == *email,
            _ => false,
        }
    }

    /// May `actor` delete `target`? Self-deletion is always rejected.
    pub fn can_delete(&self, target: &User, actor: &User) -> PolicyDecision {
        if actor.id == target.id {
            return PolicyDecision::deny("cannot delete own account");
        }
        if self.is_original_master(target) {
            return PolicyDecision::deny("cannot delete the original master account");
        }
        if target.role.is_master() {
            return PolicyDecision::deny("cannot delete a MASTER account");
        }
        if actor.role.is_admin() && target.role.is_admin() {
            return PolicyDecision::deny("an ADMIN cannot delete another ADMIN");
        }
        PolicyDecision::Allow
    }

    /// May `actor` disable `target`?
    ///
    /// Unlike deletion there is no self check: an account disabling
    /// itself is a supported flow, and the asymmetry is intentional.
    pub fn can_disable(&self, target: &User, actor: &User) -> PolicyDecision {
        if self.is_original_master(target) {
            return PolicyDecision::deny("cannot disable the original master account");
        }
        if target.role.is_master() {
            return PolicyDecision::deny("cannot disable a MASTER account");
        }
        if actor.role.is_admin() && target.role.is_admin() && actor.id != target.id {
            return PolicyDecision::deny("an ADMIN cannot disable another ADMIN");
        }
        PolicyDecision::Allow
    }

    /// May `actor` block `target`? Same ladder as disabling.
    pub fn can_block(&self, target: &User, actor: &User) -> PolicyDecision {
        if self.is_original_master(target) {
            return PolicyDecision::deny("cannot block the original master account");
        }
        if target.role.is_master() {
            return PolicyDecision::deny("cannot block a MASTER account");
        }
        if actor.role.is_admin() && target.role.is_admin() && actor.id != target.id {
            return PolicyDecision::deny("an ADMIN cannot block another ADMIN");
        }
        PolicyDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::Role;
    use uuid::Uuid;

    const RECOVERY_EMAIL: &str = "founder@gigbooks.dev";

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
        MasterPolicy::new(Some(RECOVERY_EMAIL.to_string()))
    }

    #[test]
    fn test_original_master_requires_both_email_and_role() {
        let policy = policy();

        let original = account(Role::Master, RECOVERY_EMAIL);
        assert!(policy.is_original_master(&original));

        // Same email, wrong role
        let demoted = account(Role::User, RECOVERY_EMAIL);
        assert!(!policy.is_original_master(&demoted));

        // Right role, different email
        let other_master = account(Role::Master, "other@gigbooks.dev");
        assert!(!policy.is_original_master(&other_master));
    }

    #[test]
    fn test_no_recovery_email_means_no_original_master() {
        let unconfigured = MasterPolicy::new(None);
        let master = account(Role::Master, RECOVERY_EMAIL);
        assert!(!unconfigured.is_original_master(&master));

        let blank = MasterPolicy::new(Some(String::new()));
        assert!(!blank.is_original_master(&master));
    }

    #[test]
    fn test_original_master_is_untouchable_by_every_actor() {
        let policy = policy();
        let original = account(Role::Master, RECOVERY_EMAIL);

        for actor_role in [Role::Master, Role::Admin, Role::User] {
            let actor = account(actor_role, "actor@gigbooks.dev");
            assert!(!policy.can_delete(&original, &actor).is_allowed());
            assert!(!policy.can_disable(&original, &actor).is_allowed());
            assert!(!policy.can_block(&original, &actor).is_allowed());
        }
    }

    #[test]
    fn test_master_accounts_are_never_deletable() {
        let policy = policy();
        let master = account(Role::Master, "second@gigbooks.dev");

        for actor_role in [Role::Master, Role::Admin, Role::User] {
            let actor = account(actor_role, "actor@gigbooks.dev");
            let decision = policy.can_delete(&master, &actor);
            assert_eq!(decision.reason(), Some("cannot delete a MASTER account"));
        }
    }

    #[test]
    fn test_admin_cannot_touch_a_distinct_admin() {
        let policy = policy();
        let actor = account(Role::Admin, "admin1@gigbooks.dev");
        let target = account(Role::Admin, "admin2@gigbooks.dev");

        assert_eq!(
            policy.can_delete(&target, &actor).reason(),
            Some("an ADMIN cannot delete another ADMIN")
        );
        assert_eq!(
            policy.can_disable(&target, &actor).reason(),
            Some("an ADMIN cannot disable another ADMIN")
        );
        assert_eq!(
            policy.can_block(&target, &actor).reason(),
            Some("an ADMIN cannot block another ADMIN")
        );
    }

    #[test]
    fn test_self_delete_is_always_denied() {
        let policy = policy();

        for role in [Role::Master, Role::Admin, Role::User] {
            let actor = account(role, "self@gigbooks.dev");
            let decision = policy.can_delete(&actor, &actor);
            assert_eq!(decision.reason(), Some("cannot delete own account"));
        }
    }

    #[test]
    fn test_self_disable_is_permitted_for_non_master() {
        let policy = policy();

        // The disable ladder deliberately has no self check
        for role in [Role::Admin, Role::User] {
            let actor = account(role, "self@gigbooks.dev");
            assert!(policy.can_disable(&actor, &actor).is_allowed());
        }

        // A MASTER still trips the master-account rule
        let master = account(Role::Master, "self@gigbooks.dev");
        assert!(!policy.can_disable(&master, &master).is_allowed());
    }

    #[test]
    fn test_master_may_delete_ordinary_accounts() {
        let policy = policy();
        let master = account(Role::Master, RECOVERY_EMAIL);

        let user = account(Role::User, "driver@gigbooks.dev");
        let admin = account(Role::Admin, "admin@gigbooks.dev");

        assert!(policy.can_delete(&user, &master).is_allowed());
        assert!(policy.can_delete(&admin, &master).is_allowed());
        assert!(policy.can_block(&admin, &master).is_allowed());
        assert!(policy.can_disable(&admin, &master).is_allowed());
    }

    #[test]
    fn test_admin_may_manage_plain_users() {
        let policy = policy();
        let admin = account(Role::Admin, "admin@gigbooks.dev");
        let user = account(Role::User, "driver@gigbooks.dev");

        assert!(policy.can_delete(&user, &admin).is_allowed());
        assert!(policy.can_disable(&user, &admin).is_allowed());
        assert!(policy.can_block(&user, &admin).is_allowed());
    }

    #[test]
    fn test_denial_converts_to_forbidden() {
        let policy = policy();
        let actor = account(Role::User, "self@gigbooks.dev");

        let err = policy.can_delete(&actor, &actor).into_result().unwrap_err();
        assert!(matches!(err, AppError::Forbidden(reason) if reason == "cannot delete own account"));

        assert!(PolicyDecision::Allow.into_result().is_ok());
    }
}
