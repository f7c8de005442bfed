//! Cursor pagination of a customer's bookings and payments.

mod common;

use std::collections::HashSet;

use common::{TestApp, slot_time};
use frulo_booking::error::AppError;
use frulo_booking::models::{BookingQuery, CursorParams};
use frulo_booking::entities::BookingStatus;
use frulo_booking::models::Decision;
use uuid::Uuid;

async fn seed_bookings(app: &TestApp, customer: Uuid, count: u32) -> Vec<Uuid> {
    let vendor = app.vendor().await;
    let service = app.service(vendor.id, "Braids", 8_000).await;
    let mut ids = Vec::new();
    for i in 0..count {
        let booking = app
            .bookings
            .reserve(customer, service.id, slot_time(1 + i / 10, 8 + i % 10))
            .await
            .unwrap();
        ids.push(booking.id);
    }
    ids
}

#[tokio::test]
async fn test_cursor_pages_are_complete_and_newest_first() {
    let app = TestApp::new().await;
    let kim = app.customer("kim@example.com").await;
    let created = seed_bookings(&app, kim, 25).await;

    let mut seen = Vec::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        let page = app
            .bookings
            .list_by_user(kim, &CursorParams::new(cursor, None))
            .await
            .unwrap();
        pages += 1;
        seen.extend(page.items.iter().map(|b| (b.created_at, b.id)));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 25);
    let unique: HashSet<Uuid> = seen.iter().map(|(_, id)| *id).collect();
    assert_eq!(unique.len(), 25);
    assert_eq!(unique, created.into_iter().collect::<HashSet<_>>());
    assert!(
        seen.windows(2).all(|w| w[0] >= w[1]),
        "bookings must be ordered by created_at DESC, id DESC"
    );
}

#[tokio::test]
async fn test_page_size_and_exact_boundary() {
    let app = TestApp::new().await;
    let lee = app.customer("lee@example.com").await;
    seed_bookings(&app, lee, 4).await;

    let page = app
        .bookings
        .list_by_user(lee, &CursorParams::new(None, Some(4)))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 4);
    assert_eq!(page.next_cursor, None);

    let page = app
        .bookings
        .list_by_user(lee, &CursorParams::new(None, Some(3)))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    let rest = app
        .bookings
        .list_by_user(lee, &CursorParams::new(page.next_cursor, Some(3)))
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.next_cursor, None);
}

#[tokio::test]
async fn test_customers_only_see_their_own_bookings() {
    let app = TestApp::new().await;
    let mia = app.customer("mia@example.com").await;
    let ned = app.customer("ned@example.com").await;
    let mine = seed_bookings(&app, mia, 3).await;

    let page = app
        .bookings
        .list_by_user(ned, &CursorParams::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());

    // 他人的预约 id 不能作为游标
    let err = app
        .bookings
        .list_by_user(ned, &CursorParams::new(Some(mine[0]), None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_transactions_follow_bookings() {
    let app = TestApp::new().await;
    let ola = app.customer("ola@example.com").await;
    let ids = seed_bookings(&app, ola, 12).await;

    let first = app
        .transactions
        .list_by_user(ola, &CursorParams::default())
        .await
        .unwrap();
    assert_eq!(first.items.len(), 10);
    let second = app
        .transactions
        .list_by_user(ola, &CursorParams::new(first.next_cursor, None))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.next_cursor, None);

    let booked: HashSet<Uuid> = ids.into_iter().collect();
    assert!(
        first
            .items
            .iter()
            .chain(second.items.iter())
            .all(|t| booked.contains(&t.booking_id))
    );
}

#[tokio::test]
async fn test_vendor_listing_filters_by_status() {
    let app = TestApp::new().await;
    let pat = app.customer("pat@example.com").await;
    let ids = seed_bookings(&app, pat, 5).await;
    let vendor = app.vendor().await;

    app.settlement
        .decide(ids[0], Decision::Approve, vendor.id)
        .await
        .unwrap();
    app.settlement
        .decide(ids[1], Decision::Reject, vendor.id)
        .await
        .unwrap();

    let pending = app
        .bookings
        .list_all(&BookingQuery {
            status: Some(BookingStatus::Pending),
            page: Some(1),
            per_page: Some(2),
        })
        .await
        .unwrap();
    assert_eq!(pending.total, 3);
    assert_eq!(pending.items.len(), 2);
    assert_eq!(pending.total_pages, 2);

    let all = app.bookings.list_all(&BookingQuery::default()).await.unwrap();
    assert_eq!(all.total, 5);
}
