//! Audit trail service tests against mocked repositories.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};

use gigbooks::domain::audit::actions;
use gigbooks::domain::{AuditLogFilter, RequestContext, Role};
use gigbooks::errors::AppError;
use gigbooks::infra::{MockAuditLogRepository, MockUserRepository};
use gigbooks::services::{AuditRecorder, AuditService};
use gigbooks::types::PaginationParams;

use common::{account, persisted, TestUnitOfWork};

const RETENTION_FLOOR: i64 = 30;

fn service(audit_logs: MockAuditLogRepository) -> AuditRecorder<TestUnitOfWork> {
    AuditRecorder::new(
        Arc::new(TestUnitOfWork::new(MockUserRepository::new(), audit_logs)),
        RETENTION_FLOOR,
    )
}

#[tokio::test]
async fn purge_refuses_non_master_actors() {
    // A refused purge must neither delete rows nor leave a trail entry
    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs.expect_delete_older_than().times(0);
    audit_logs.expect_insert().times(0);
    let svc = service(audit_logs);

    for role in [Role::Admin, Role::User] {
        let actor = account(role, "actor@gigbooks.dev");
        let result = svc.purge(&actor, 90, RequestContext::default()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}

#[tokio::test]
async fn purge_refuses_windows_below_the_floor() {
    let svc = service(MockAuditLogRepository::new());
    let master = account(Role::Master, "founder@gigbooks.dev");

    let result = svc.purge(&master, 7, RequestContext::default()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn purge_at_the_floor_is_accepted() {
    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs
        .expect_delete_older_than()
        .returning(|_| Ok(0));
    audit_logs
        .expect_insert()
        .returning(|event, ctx| Ok(persisted(event, ctx)));

    let svc = service(audit_logs);
    let master = account(Role::Master, "founder@gigbooks.dev");

    let outcome = svc
        .purge(&master, RETENTION_FLOOR, RequestContext::default())
        .await
        .unwrap();
    assert_eq!(outcome.retain_days, RETENTION_FLOOR);
}

#[tokio::test]
async fn purge_deletes_and_leaves_its_own_trail_entry() {
    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs
        .expect_delete_older_than()
        .withf(|cutoff| {
            // Cutoff is ~90 days back from now
            let expected = Utc::now() - Duration::days(90);
            (*cutoff - expected).num_seconds().abs() < 5
        })
        .returning(|_| Ok(42));
    audit_logs
        .expect_insert()
        .withf(|event, _| {
            event.action == actions::PURGE_AUDIT_LOGS
                && event.resource_type == "system"
                && event.performed_by == "founder@gigbooks.dev"
        })
        .returning(|event, ctx| Ok(persisted(event, ctx)));

    let svc = service(audit_logs);
    let master = account(Role::Master, "founder@gigbooks.dev");

    let outcome = svc.purge(&master, 90, RequestContext::default()).await.unwrap();

    assert_eq!(outcome.removed, 42);
    assert_eq!(outcome.retain_days, 90);
}

#[tokio::test]
async fn query_passes_the_filter_through() {
    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs
        .expect_query()
        .withf(|filter, pagination| {
            filter.action.as_deref() == Some("BLOCK_USER") && pagination.page == 2
        })
        .returning(|_, _| Ok((vec![], 0)));

    let svc = service(audit_logs);
    let filter = AuditLogFilter {
        action: Some("BLOCK_USER".to_string()),
        ..Default::default()
    };
    let pagination = PaginationParams {
        page: 2,
        per_page: 20,
    };

    let (entries, total) = svc.query(filter, pagination).await.unwrap();
    assert!(entries.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn auth_entries_carry_the_request_origin() {
    let mut audit_logs = MockAuditLogRepository::new();
    audit_logs
        .expect_insert()
        .withf(|event, ctx| {
            event.resource_type == "auth"
                && ctx.ip_address.as_deref() == Some("203.0.113.7")
                && ctx.user_agent.as_deref() == Some("worker-cli/1.0")
        })
        .returning(|event, ctx| Ok(persisted(event, ctx)));

    let svc = service(audit_logs);
    let ctx = RequestContext {
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: Some("worker-cli/1.0".to_string()),
    };

    let entry = svc
        .record_auth_action(
            actions::LOGIN_FAILED,
            "driver@gigbooks.dev",
            "Failed login attempt".to_string(),
            false,
            None,
            ctx,
        )
        .await
        .unwrap();

    assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.7"));
}
