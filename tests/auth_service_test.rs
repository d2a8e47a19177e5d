//! Authentication service tests against mocked repositories.

mod common;

use mockall::predicate::eq;
use std::sync::Arc;

use gigbooks::config::Config;
use gigbooks::domain::audit::actions;
use gigbooks::domain::{Password, RequestContext, Role};
use gigbooks::errors::AppError;
use gigbooks::infra::{MockAuditLogRepository, MockUserRepository};
use gigbooks::services::{AuthService, Authenticator};

use common::{account, persisted, TestUnitOfWork};

fn service(
    users: MockUserRepository,
    audit_logs: MockAuditLogRepository,
) -> Authenticator<TestUnitOfWork> {
    Authenticator::new(
        Arc::new(TestUnitOfWork::new(users, audit_logs)),
        Config::for_tests(),
    )
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email_with_deleted()
        .with(eq("taken@gigbooks.dev"))
        .returning(|_| Ok(Some(account(Role::User, "taken@gigbooks.dev"))));

    let svc = service(users, MockAuditLogRepository::new());
    let result = svc
        .register(
            "taken@gigbooks.dev".to_string(),
            "newuser".to_string(),
            "password123".to_string(),
            "New User".to_string(),
            RequestContext::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn register_rejects_duplicate_username_even_if_deleted() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email_with_deleted()
        .returning(|_| Ok(None));
    users
        .expect_find_by_username_with_deleted()
        .with(eq("driver42"))
        .returning(|_| {
            let mut user = account(Role::User, "old@gigbooks.dev");
            user.deleted_at = Some(chrono::Utc::now());
            Ok(Some(user))
        });

    let svc = service(users, MockAuditLogRepository::new());
    let result = svc
        .register(
            "new@gigbooks.dev".to_string(),
            "driver42".to_string(),
            "password123".to_string(),
            "New User".to_string(),
            RequestContext::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn register_creates_user_role_account_and_audits() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email_with_deleted()
        .returning(|_| Ok(None));
    users
        .expect_find_by_username_with_deleted()
        .returning(|_| Ok(None));
    users
        .expect_create()
        .withf(|email, username, hash, name| {
            email == "new@gigbooks.dev"
                && username == "driver42"
                && hash.starts_with("$argon2")
                && name == "New User"
        })
        .returning(|email, username, hash, name| {
            Ok(gigbooks::domain::User::new(
                uuid::Uuid::new_v4(),
                email,
                username,
                hash,
                name,
            ))
        });

    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs
        .expect_insert()
        .withf(|event, _| event.action == actions::REGISTER_USER && event.resource_type == "auth")
        .returning(|event, ctx| Ok(persisted(event, ctx)));

    let svc = service(users, audit_logs);
    let user = svc
        .register(
            "new@gigbooks.dev".to_string(),
            "driver42".to_string(),
            "password123".to_string(),
            "New User".to_string(),
            RequestContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(user.role, Role::User);
    assert!(user.is_active);
    // The hash goes to storage, never the plaintext
    assert_ne!(user.password_hash, "password123");
}

#[tokio::test]
async fn login_with_wrong_password_fails_and_audits() {
    let stored = Password::new("correct-password-123").unwrap().into_string();
    let mut user = account(Role::User, "driver@gigbooks.dev");
    user.password_hash = stored;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .returning(move |_| Ok(Some(user.clone())));

    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs
        .expect_insert()
        .withf(|event, _| event.action == actions::LOGIN_FAILED)
        .returning(|event, ctx| Ok(persisted(event, ctx)));

    let svc = service(users, audit_logs);
    let result = svc
        .login(
            "driver@gigbooks.dev".to_string(),
            "wrong-password".to_string(),
            RequestContext::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn login_with_unknown_email_fails_closed() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().returning(|_| Ok(None));

    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs
        .expect_insert()
        .withf(|event, _| event.action == actions::LOGIN_FAILED)
        .returning(|event, ctx| Ok(persisted(event, ctx)));

    let svc = service(users, audit_logs);
    let result = svc
        .login(
            "nobody@gigbooks.dev".to_string(),
            "whatever".to_string(),
            RequestContext::default(),
        )
        .await;

    // Same error as a wrong password, so emails cannot be enumerated
    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn login_success_issues_verifiable_token() {
    let stored = Password::new("correct-password-123").unwrap().into_string();
    let mut user = account(Role::User, "driver@gigbooks.dev");
    user.password_hash = stored;
    let user_id = user.id;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .returning(move |_| Ok(Some(user.clone())));

    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs
        .expect_insert()
        .withf(|event, _| event.action == actions::LOGIN_SUCCESS)
        .returning(|event, ctx| Ok(persisted(event, ctx)));

    let svc = service(users, audit_logs);
    let token = svc
        .login(
            "driver@gigbooks.dev".to_string(),
            "correct-password-123".to_string(),
            RequestContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(token.token_type, "Bearer");
    assert!(token.expires_in > 0);

    let claims = svc.verify_token(&token.access_token).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email, "driver@gigbooks.dev");
}

#[tokio::test]
async fn login_blocked_account_rejected_even_with_correct_password() {
    let stored = Password::new("correct-password-123").unwrap().into_string();
    let mut user = account(Role::User, "driver@gigbooks.dev");
    user.password_hash = stored;
    user.blocked_at = Some(chrono::Utc::now());
    user.is_active = false;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .returning(move |_| Ok(Some(user.clone())));

    // No audit expectation: the failure happens after credentials pass,
    // before a success entry would be written
    let svc = service(users, MockAuditLogRepository::new());
    let result = svc
        .login(
            "driver@gigbooks.dev".to_string(),
            "correct-password-123".to_string(),
            RequestContext::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn login_disabled_account_rejected() {
    let stored = Password::new("correct-password-123").unwrap().into_string();
    let mut user = account(Role::User, "driver@gigbooks.dev");
    user.password_hash = stored;
    user.is_active = false;

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .returning(move |_| Ok(Some(user.clone())));

    let svc = service(users, MockAuditLogRepository::new());
    let result = svc
        .login(
            "driver@gigbooks.dev".to_string(),
            "correct-password-123".to_string(),
            RequestContext::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let svc = service(MockUserRepository::new(), MockAuditLogRepository::new());
    let result = svc.verify_token("not.a.token");
    assert!(result.is_err());
}
