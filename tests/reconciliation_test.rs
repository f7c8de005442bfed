//! Drift detection and vendor reports.

mod common;

use common::{TestApp, slot_time};
use frulo_booking::entities::{
    IssueKind, slot_reservation_entity as slots, user_entity as users,
};
use frulo_booking::models::{ConsistencyIssueQuery, Decision, DashboardStats};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

async fn set_balance(db: &DatabaseConnection, user_id: Uuid, amount: i64) {
    users::Entity::update_many()
        .col_expr(users::Column::TotalPayment, Expr::value(amount))
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_clean_ledger_has_no_issues() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    let haircut = app.service(vendor.id, "Haircut", 5_000).await;
    let alice = app.customer("alice@example.com").await;
    let bob = app.customer("bob@example.com").await;

    let a = app
        .bookings
        .reserve(alice, haircut.id, slot_time(10, 14))
        .await
        .unwrap();
    let b = app
        .bookings
        .reserve(bob, haircut.id, slot_time(10, 15))
        .await
        .unwrap();
    app.bookings
        .reserve(bob, haircut.id, slot_time(10, 16))
        .await
        .unwrap();
    app.settlement
        .decide(a.id, Decision::Approve, vendor.id)
        .await
        .unwrap();
    app.settlement
        .decide(b.id, Decision::Reject, vendor.id)
        .await
        .unwrap();

    let report = app.reconciliation.run().await.unwrap();
    assert_eq!(report.users_checked, 3);
    assert_eq!(report.issues_found, 0);
    assert_eq!(report.issues_recorded, 0);
}

#[tokio::test]
async fn test_balance_drift_is_recorded_once() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    let haircut = app.service(vendor.id, "Haircut", 5_000).await;
    let alice = app.customer("alice@example.com").await;
    let booking = app
        .bookings
        .reserve(alice, haircut.id, slot_time(10, 14))
        .await
        .unwrap();
    app.settlement
        .decide(booking.id, Decision::Approve, vendor.id)
        .await
        .unwrap();

    users::Entity::update_many()
        .col_expr(users::Column::TotalPayment, Expr::value(9_999i64))
        .filter(users::Column::Id.eq(alice))
        .exec(&app.db)
        .await
        .unwrap();

    let first = app.reconciliation.run().await.unwrap();
    assert_eq!(first.issues_found, 1);
    assert_eq!(first.issues_recorded, 1);

    let second = app.reconciliation.run().await.unwrap();
    assert_eq!(second.issues_found, 1);
    assert_eq!(second.issues_recorded, 0);

    let issues = app
        .reconciliation
        .list_issues(&ConsistencyIssueQuery {
            resolved: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(issues.total, 1);
    let issue = &issues.items[0];
    assert_eq!(issue.kind, IssueKind::BalanceDrift);
    assert_eq!(issue.user_id, Some(alice));
    assert_eq!(issue.expected, Some(5_000));
    assert_eq!(issue.actual, Some(9_999));
}

#[tokio::test]
async fn test_missing_reservation_and_count_drift() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    let haircut = app.service(vendor.id, "Haircut", 5_000).await;
    let carl = app.customer("carl@example.com").await;
    let booking = app
        .bookings
        .reserve(carl, haircut.id, slot_time(2, 9))
        .await
        .unwrap();

    slots::Entity::delete_many()
        .filter(slots::Column::BookingId.eq(booking.id))
        .exec(&app.db)
        .await
        .unwrap();
    users::Entity::update_many()
        .col_expr(users::Column::Bookings, Expr::value(3i64))
        .filter(users::Column::Id.eq(carl))
        .exec(&app.db)
        .await
        .unwrap();

    let report = app.reconciliation.run().await.unwrap();
    assert_eq!(report.issues_recorded, 2);

    let issues = app
        .reconciliation
        .list_issues(&ConsistencyIssueQuery::default())
        .await
        .unwrap();
    let kinds: Vec<IssueKind> = issues.items.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&IssueKind::MissingReservation));
    assert!(kinds.contains(&IssueKind::BookingCountDrift));
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    let haircut = app.service(vendor.id, "Haircut", 5_000).await;
    let nails = app.service(vendor.id, "Nails", 3_000).await;
    let dee = app.customer("dee@example.com").await;
    let eli = app.customer("eli@example.com").await;

    let approved = app
        .bookings
        .reserve(dee, haircut.id, slot_time(4, 10))
        .await
        .unwrap();
    let rejected = app
        .bookings
        .reserve(eli, nails.id, slot_time(4, 10))
        .await
        .unwrap();
    app.bookings
        .reserve(eli, haircut.id, slot_time(4, 11))
        .await
        .unwrap();
    app.bookings
        .reserve(dee, nails.id, slot_time(4, 12))
        .await
        .unwrap();

    app.settlement
        .decide(approved.id, Decision::Approve, vendor.id)
        .await
        .unwrap();
    app.settlement
        .decide(rejected.id, Decision::Reject, vendor.id)
        .await
        .unwrap();

    let stats = app.reports.dashboard_stats().await.unwrap();
    assert_eq!(
        stats,
        DashboardStats {
            pending: 2,
            approved: 1,
            rejected: 1,
            services: 2,
            customers: 2,
            initiated_transactions: 2,
            approved_revenue: 5_000,
            initiated_revenue: 8_000,
        }
    );

    let profile = app.users.get_profile(dee).await.unwrap();
    assert_eq!(profile.user.total_payment, 5_000);
    assert_eq!(profile.user.bookings, 2);
    assert_eq!(profile.status_counts.approved, 1);
    assert_eq!(profile.status_counts.pending, 1);
    assert_eq!(profile.status_counts.rejected, 0);
}

#[tokio::test]
async fn test_resolved_issue_is_recorded_again_on_new_drift() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    let haircut = app.service(vendor.id, "Haircut", 5_000).await;
    let fay = app.customer("fay@example.com").await;
    let booking = app
        .bookings
        .reserve(fay, haircut.id, slot_time(12, 10))
        .await
        .unwrap();
    app.settlement
        .decide(booking.id, Decision::Approve, vendor.id)
        .await
        .unwrap();

    set_balance(&app.db, fay, 7_000).await;
    assert_eq!(app.reconciliation.run().await.unwrap().issues_recorded, 1);

    // 未解决时数值变化也单独记录
    set_balance(&app.db, fay, 7_500).await;
    assert_eq!(app.reconciliation.run().await.unwrap().issues_recorded, 1);

    let open = app
        .reconciliation
        .list_issues(&ConsistencyIssueQuery {
            resolved: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(open.total, 2);

    for issue in &open.items {
        let resolved = app.reconciliation.resolve_issue(issue.id).await.unwrap();
        assert!(resolved.resolved);
    }
    // 重复标记无副作用
    let again = app
        .reconciliation
        .resolve_issue(open.items[0].id)
        .await
        .unwrap();
    assert!(again.resolved);

    // 同样的偏差在解决后再次出现，写入新记录
    assert_eq!(app.reconciliation.run().await.unwrap().issues_recorded, 1);

    let resolved = app
        .reconciliation
        .list_issues(&ConsistencyIssueQuery {
            resolved: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(resolved.total, 2);

    let still_open = app
        .reconciliation
        .list_issues(&ConsistencyIssueQuery {
            resolved: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(still_open.total, 1);
    assert_eq!(still_open.items[0].actual, Some(7_500));

    let missing = app
        .reconciliation
        .resolve_issue(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(missing, frulo_booking::error::AppError::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_below_zero_count_is_flagged() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    let haircut = app.service(vendor.id, "Haircut", 5_000).await;
    let gus = app.customer("gus@example.com").await;
    let booking = app
        .bookings
        .reserve(gus, haircut.id, slot_time(14, 9))
        .await
        .unwrap();

    users::Entity::update_many()
        .col_expr(users::Column::Bookings, Expr::value(0i64))
        .filter(users::Column::Id.eq(gus))
        .exec(&app.db)
        .await
        .unwrap();

    app.bookings.cancel(booking.id, gus).await.unwrap();
    assert_eq!(app.user(gus).await.bookings, -1);

    let report = app.reconciliation.run().await.unwrap();
    assert_eq!(report.issues_recorded, 1);

    let issues = app
        .reconciliation
        .list_issues(&ConsistencyIssueQuery::default())
        .await
        .unwrap();
    assert_eq!(issues.items[0].kind, IssueKind::BookingCountDrift);
    assert_eq!(issues.items[0].expected, Some(0));
    assert_eq!(issues.items[0].actual, Some(-1));
}
