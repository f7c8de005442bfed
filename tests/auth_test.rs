//! Registration, email verification, login and account lifecycle.

mod common;

use chrono::{Duration, Utc};
use common::{CUSTOMER_PASSWORD, TestApp, slot_time};
use frulo_booking::entities::{UserRole, user_entity as users};
use frulo_booking::error::AppError;
use frulo_booking::models::{LoginRequest, RefreshRequest, RegisterRequest, VerifyEmailRequest};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.into(),
        password: password.into(),
    }
}

async fn age_account(app: &TestApp, email: &str, minutes: i64) {
    users::Entity::update_many()
        .col_expr(
            users::Column::CreatedAt,
            Expr::value(Utc::now() - Duration::minutes(minutes)),
        )
        .filter(users::Column::Email.eq(email))
        .exec(&app.db)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unverified_login_is_refused_until_verified() {
    let app = TestApp::new().await;
    app.register_customer("Quinn@Example.com").await;

    let err = app
        .auth
        .login(login("quinn@example.com", CUSTOMER_PASSWORD))
        .await
        .unwrap_err();
    match err {
        AppError::AuthError(msg) => assert!(msg.contains("verify")),
        other => panic!("unexpected error: {other}"),
    }

    let token = app.verification_token("quinn@example.com").await;
    let err = app
        .auth
        .verify_email(VerifyEmailRequest {
            email: "quinn@example.com".into(),
            token: "wrong".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthError(_)));

    let verified = app
        .auth
        .verify_email(VerifyEmailRequest {
            email: "quinn@example.com".into(),
            token,
        })
        .await
        .unwrap();
    assert!(verified.email_verified);

    let session = app
        .auth
        .login(login("QUINN@example.com", CUSTOMER_PASSWORD))
        .await
        .unwrap();
    assert_eq!(session.token_type, "Bearer");
    assert_eq!(session.user.role, UserRole::Customer);
    assert_eq!(session.user.login_times, 1);
    assert!(session.user.last_seen.is_some());

    let claims = app.jwt.verify_access_token(&session.access_token).unwrap();
    assert_eq!(claims.user_id().unwrap(), session.user.id);
    assert_eq!(claims.role, UserRole::Customer);
}

#[tokio::test]
async fn test_expired_unverified_account_is_removed_on_login() {
    let app = TestApp::new().await;
    let id = app.register_customer("rita@example.com").await;
    age_account(&app, "rita@example.com", 6).await;

    let err = app
        .auth
        .login(login("rita@example.com", CUSTOMER_PASSWORD))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthError(_)));

    let gone = users::Entity::find_by_id(id).one(&app.db).await.unwrap();
    assert!(gone.is_none());

    // 同一邮箱可以重新注册
    app.register_customer("rita@example.com").await;
}

#[tokio::test]
async fn test_bad_credentials_and_duplicates() {
    let app = TestApp::new().await;
    app.customer("sam@example.com").await;

    let err = app
        .auth
        .login(login("sam@example.com", "password999"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthError(_)));

    let err = app
        .auth
        .login(login("nobody@example.com", CUSTOMER_PASSWORD))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthError(_)));

    let err = app
        .auth
        .register(RegisterRequest {
            name: "Sam Again".into(),
            email: "SAM@example.com".into(),
            password: CUSTOMER_PASSWORD.into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    for (email, password) in [("not-an-email", CUSTOMER_PASSWORD), ("tia@example.com", "short")] {
        let err = app
            .auth
            .register(RegisterRequest {
                name: "Tia".into(),
                email: email.into(),
                password: password.into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}

#[tokio::test]
async fn test_refresh_issues_new_session() {
    let app = TestApp::new().await;
    app.customer("uma@example.com").await;
    let session = app
        .auth
        .login(login("uma@example.com", CUSTOMER_PASSWORD))
        .await
        .unwrap();

    let refreshed = app
        .auth
        .refresh(RefreshRequest {
            refresh_token: session.refresh_token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(refreshed.user.id, session.user.id);

    // 访问令牌不能用于刷新
    let err = app
        .auth
        .refresh(RefreshRequest {
            refresh_token: session.access_token,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthError(_) | AppError::JwtError(_)));
}

#[tokio::test]
async fn test_delete_account_requires_no_pending_bookings() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    let haircut = app.service(vendor.id, "Haircut", 5_000).await;
    let vic = app.customer("vic@example.com").await;

    let booking = app
        .bookings
        .reserve(vic, haircut.id, slot_time(20, 10))
        .await
        .unwrap();
    let err = app.auth.delete_account(vic).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    app.bookings.cancel(booking.id, vic).await.unwrap();
    app.auth.delete_account(vic).await.unwrap();
    assert!(users::Entity::find_by_id(vic).one(&app.db).await.unwrap().is_none());

    let err = app.auth.delete_account(vendor.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn test_vendor_bootstrap_is_idempotent() {
    let app = TestApp::new().await;
    let first = app.vendor().await;
    let second = app.vendor().await;
    assert_eq!(first.id, second.id);
    assert_eq!(first.role, UserRole::Vendor);
    assert!(first.email_verified);

    let session = app
        .auth
        .login(login(common::VENDOR_EMAIL, common::VENDOR_PASSWORD))
        .await
        .unwrap();
    assert_eq!(session.user.role, UserRole::Vendor);
}

#[tokio::test]
async fn test_purge_removes_only_stale_unverified_accounts() {
    let app = TestApp::new().await;
    app.register_customer("stale@example.com").await;
    app.register_customer("fresh@example.com").await;
    app.customer("done@example.com").await;
    age_account(&app, "stale@example.com", 30).await;
    age_account(&app, "done@example.com", 30).await;

    let purged = app.auth.purge_unverified().await.unwrap();
    assert_eq!(purged, 1);

    let remaining: Vec<String> = users::Entity::find()
        .all(&app.db)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.email)
        .collect();
    assert!(remaining.contains(&"fresh@example.com".to_string()));
    assert!(remaining.contains(&"done@example.com".to_string()));
    assert!(!remaining.contains(&"stale@example.com".to_string()));
}
