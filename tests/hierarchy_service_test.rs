//! Hierarchy listing tests against mocked repositories.
//!
//! The mutating operations run inside a transaction with a row lock and
//! are covered by their gate tests; here the focus is that each actor
//! role maps to the correct visibility scope before the query runs.

mod common;

use std::sync::Arc;

use gigbooks::domain::{MasterPolicy, Role, UserFilters, VisibilityScope};
use gigbooks::infra::{MockAuditLogRepository, MockUserRepository};
use gigbooks::services::{HierarchyManager, HierarchyService};
use gigbooks::types::PaginationParams;

use common::{account, TestUnitOfWork};

fn service(users: MockUserRepository) -> HierarchyManager<TestUnitOfWork> {
    HierarchyManager::new(
        Arc::new(TestUnitOfWork::new(users, MockAuditLogRepository::new())),
        MasterPolicy::new(Some("founder@gigbooks.dev".to_string())),
    )
}

#[tokio::test]
async fn master_lists_with_full_scope() {
    let mut users = MockUserRepository::new();
    users
        .expect_list_scoped()
        .withf(|scope, _, _| *scope == VisibilityScope::All)
        .returning(|_, _, _| {
            Ok((
                vec![
                    account(Role::Master, "founder@gigbooks.dev"),
                    account(Role::Admin, "admin@gigbooks.dev"),
                    account(Role::User, "driver@gigbooks.dev"),
                ],
                3,
            ))
        });

    let svc = service(users);
    let master = account(Role::Master, "founder@gigbooks.dev");

    let (listed, total) = svc
        .get_visible_users(&master, UserFilters::default(), PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(listed.len(), 3);
    assert_eq!(total, 3);
}

#[tokio::test]
async fn plain_admin_lists_users_only() {
    let mut users = MockUserRepository::new();
    users
        .expect_list_scoped()
        .withf(|scope, _, _| *scope == VisibilityScope::UsersOnly)
        .returning(|_, _, _| Ok((vec![account(Role::User, "driver@gigbooks.dev")], 1)));

    let svc = service(users);
    let admin = account(Role::Admin, "admin@gigbooks.dev");

    let (listed, _) = svc
        .get_visible_users(&admin, UserFilters::default(), PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn granted_admin_also_sees_other_admins() {
    let mut users = MockUserRepository::new();
    users
        .expect_list_scoped()
        .withf(|scope, _, _| *scope == VisibilityScope::UsersAndAdmins)
        .returning(|_, _, _| Ok((vec![], 0)));

    let svc = service(users);
    let mut admin = account(Role::Admin, "admin@gigbooks.dev");
    admin.can_view_admins = true;

    svc.get_visible_users(&admin, UserFilters::default(), PaginationParams::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn plain_user_is_scoped_to_self() {
    let user = account(Role::User, "driver@gigbooks.dev");
    let user_id = user.id;

    let mut users = MockUserRepository::new();
    users
        .expect_list_scoped()
        .withf(move |scope, _, _| *scope == VisibilityScope::SelfOnly(user_id))
        .returning(move |_, _, _| Ok((vec![account(Role::User, "driver@gigbooks.dev")], 1)));

    let svc = service(users);
    svc.get_visible_users(&user, UserFilters::default(), PaginationParams::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn explicit_filters_ride_along_with_the_scope() {
    let mut users = MockUserRepository::new();
    users
        .expect_list_scoped()
        .withf(|scope, filters, _| {
            *scope == VisibilityScope::All
                && filters.role == Some(Role::Admin)
                && filters.blocked == Some(true)
        })
        .returning(|_, _, _| Ok((vec![], 0)));

    let svc = service(users);
    let master = account(Role::Master, "founder@gigbooks.dev");

    let filters = UserFilters {
        role: Some(Role::Admin),
        blocked: Some(true),
        ..Default::default()
    };
    svc.get_visible_users(&master, filters, PaginationParams::default())
        .await
        .unwrap();
}
