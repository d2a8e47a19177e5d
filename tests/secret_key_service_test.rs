//! Recovery-key lifecycle tests against mocked repositories.

mod common;

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use mockall::predicate::eq;

use gigbooks::domain::{Role, SecretCode};
use gigbooks::errors::AppError;
use gigbooks::infra::{MockAuditLogRepository, MockUserRepository};
use gigbooks::services::{SecretKeyManager, SecretKeyService};

use common::{account, TestUnitOfWork};

fn service(users: MockUserRepository, single_use: bool) -> SecretKeyManager<TestUnitOfWork> {
    SecretKeyManager::new(
        Arc::new(TestUnitOfWork::new(users, MockAuditLogRepository::new())),
        single_use,
    )
}

/// A MASTER with a stored key for `code`, issued `age_days` ago
fn master_with_key(code: &str, age_days: i64) -> gigbooks::domain::User {
    let mut master = account(Role::Master, "founder@gigbooks.dev");
    master.secret_key_hash = Some(SecretCode::new(code).unwrap().as_str().to_string());
    master.secret_key_created_at = Some(Utc::now() - Duration::days(age_days));
    master
}

#[tokio::test]
async fn issue_refuses_non_master_actors() {
    let svc = service(MockUserRepository::new(), false);

    for role in [Role::Admin, Role::User] {
        let actor = account(role, "actor@gigbooks.dev");
        let result = svc.issue_for_master(&actor).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}

#[tokio::test]
async fn issue_stores_hash_that_verifies_the_returned_plaintext() {
    let master = account(Role::Master, "founder@gigbooks.dev");
    let master_id = master.id;

    let captured: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let sink = captured.clone();

    let mut users = MockUserRepository::new();
    users
        .expect_store_secret_key()
        .withf(move |id, hash| *id == master_id && hash.starts_with("$argon2"))
        .returning(move |_, hash| {
            *sink.lock().unwrap() = Some(hash);
            Ok(account(Role::Master, "founder@gigbooks.dev"))
        });

    let svc = service(users, false);
    let plaintext = svc.issue_for_master(&master).await.unwrap();

    assert_eq!(plaintext.len(), 16);
    assert!(plaintext
        .bytes()
        .all(|b| b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789".contains(&b)));

    // What went to storage is a hash of exactly the plaintext we got back
    let stored = captured.lock().unwrap().take().unwrap();
    assert_ne!(stored, plaintext);
    assert!(SecretCode::from_hash(stored).verify(&plaintext));
}

#[tokio::test]
async fn validate_accepts_a_key_inside_its_window() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .with(eq("founder"))
        .returning(|_| Ok(Some(master_with_key("GOODKEY234567890", 89))));

    let svc = service(users, false);
    let found = svc
        .validate_for_reset("founder", "GOODKEY234567890")
        .await
        .unwrap();

    assert!(found.is_some());
}

#[tokio::test]
async fn validate_rejects_an_expired_key() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .returning(|_| Ok(Some(master_with_key("GOODKEY234567890", 91))));

    let svc = service(users, false);
    let found = svc
        .validate_for_reset("founder", "GOODKEY234567890")
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn validate_rejects_a_wrong_key() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .returning(|_| Ok(Some(master_with_key("GOODKEY234567890", 1))));

    let svc = service(users, false);
    let found = svc
        .validate_for_reset("founder", "WRONGKEY23456789")
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn validate_rejects_non_master_accounts() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_username().returning(|_| {
        let mut admin = master_with_key("GOODKEY234567890", 1);
        admin.role = Role::Admin;
        Ok(Some(admin))
    });

    let svc = service(users, false);
    let found = svc
        .validate_for_reset("founder", "GOODKEY234567890")
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn validate_rejects_unknown_usernames() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_username().returning(|_| Ok(None));

    let svc = service(users, false);
    let found = svc
        .validate_for_reset("ghost", "GOODKEY234567890")
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn validate_rejects_accounts_without_a_stored_key() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .returning(|_| Ok(Some(account(Role::Master, "founder@gigbooks.dev"))));

    let svc = service(users, false);
    let found = svc
        .validate_for_reset("founder", "GOODKEY234567890")
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn reset_replaces_password_and_marks_the_key_used() {
    let master = master_with_key("GOODKEY234567890", 10);
    let master_id = master.id;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .returning(move |_| Ok(Some(master.clone())));
    users
        .expect_update_password()
        .withf(move |id, hash| *id == master_id && hash.starts_with("$argon2"))
        .returning(|_, _| Ok(account(Role::Master, "founder@gigbooks.dev")));
    // Default policy keeps the key until expiry: used stamp only
    users
        .expect_mark_secret_key_used()
        .with(eq(master_id), eq(false))
        .returning(|_, _| Ok(account(Role::Master, "founder@gigbooks.dev")));

    let svc = service(users, false);
    let result = svc
        .reset_password("founder", "GOODKEY234567890", "brand-new-password")
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn reset_with_bad_key_collapses_to_a_generic_error() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .returning(|_| Ok(Some(master_with_key("GOODKEY234567890", 10))));

    let svc = service(users, false);
    let result = svc
        .reset_password("founder", "WRONGKEY23456789", "brand-new-password")
        .await;

    assert!(matches!(result, Err(AppError::InvalidRecoveryKey)));
}

#[tokio::test]
async fn single_use_policy_clears_the_hash_on_use() {
    let master = master_with_key("GOODKEY234567890", 10);
    let master_id = master.id;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .returning(move |_| Ok(Some(master.clone())));
    users
        .expect_update_password()
        .returning(|_, _| Ok(account(Role::Master, "founder@gigbooks.dev")));
    users
        .expect_mark_secret_key_used()
        .with(eq(master_id), eq(true))
        .returning(|_, _| Ok(account(Role::Master, "founder@gigbooks.dev")));

    let svc = service(users, true);
    svc.reset_password("founder", "GOODKEY234567890", "brand-new-password")
        .await
        .unwrap();
}

#[tokio::test]
async fn revoke_refuses_non_master_actors() {
    let svc = service(MockUserRepository::new(), false);
    let admin = account(Role::Admin, "admin@gigbooks.dev");

    let result = svc.revoke(&admin).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn has_valid_key_is_false_without_key_material() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(|_| Ok(Some(account(Role::Master, "founder@gigbooks.dev"))));

    let svc = service(users, false);
    let master = account(Role::Master, "founder@gigbooks.dev");

    assert!(!svc.has_valid_key(master.id).await.unwrap());
}

#[tokio::test]
async fn has_valid_key_respects_expiry() {
    let fresh = master_with_key("GOODKEY234567890", 10);
    let stale = master_with_key("GOODKEY234567890", 120);

    let mut users = MockUserRepository::new();
    let fresh_id = fresh.id;
    users
        .expect_find_by_id()
        .returning(move |id| {
            if id == fresh_id {
                Ok(Some(fresh.clone()))
            } else {
                Ok(Some(stale.clone()))
            }
        });

    let svc = service(users, false);
    assert!(svc.has_valid_key(fresh_id).await.unwrap());
    assert!(!svc.has_valid_key(uuid::Uuid::new_v4()).await.unwrap());
}
