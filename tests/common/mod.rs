//! Shared setup for integration tests: a temporary SQLite database with all
//! migrations applied and every service wired the way `main` wires them.

#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use frulo_booking::config::{AuthConfig, BookingConfig, VendorConfig};
use frulo_booking::database::run_migrations;
use frulo_booking::entities::user_entity as users;
use frulo_booking::models::{CreateServiceRequest, RegisterRequest, ServiceResponse, VerifyEmailRequest};
use frulo_booking::services::*;
use frulo_booking::utils::{JwtService, RetryPolicy};
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const VENDOR_EMAIL: &str = "vendor@frulo.app";
pub const VENDOR_PASSWORD: &str = "Vendor12345";
pub const CUSTOMER_PASSWORD: &str = "password123";

/// 每个测试一个临时 SQLite 文件，WAL 模式，多连接并发
pub async fn setup_db() -> DatabaseConnection {
    let path = std::env::temp_dir().join(format!("frulo-test-{}.db", Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options
        .max_connections(8)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("failed to open sqlite test database");
    db.execute_unprepared("PRAGMA journal_mode=WAL")
        .await
        .expect("failed to enable WAL");
    run_migrations(&db).await.expect("failed to run migrations");
    db
}

pub fn test_retry_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(2)
        .initial_delay(Duration::from_millis(5))
        .max_delay(Duration::from_millis(20))
        .attempt_timeout(Duration::from_secs(10))
        .build()
}

#[derive(Clone)]
pub struct TestApp {
    pub db: DatabaseConnection,
    pub jwt: JwtService,
    pub auth: AuthService,
    pub users: UserService,
    pub catalog: CatalogService,
    pub bookings: BookingService,
    pub settlement: SettlementService,
    pub transactions: TransactionService,
    pub reports: ReportService,
    pub reconciliation: ReconciliationService,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = setup_db().await;
        let jwt = JwtService::new(JWT_SECRET, 3600, 86_400);
        let booking_config = BookingConfig::default();
        let retry = test_retry_policy();

        let reports = ReportService::new(db.clone(), retry.clone());
        Self {
            jwt: jwt.clone(),
            auth: AuthService::new(db.clone(), jwt, AuthConfig::default()).with_bcrypt_cost(4),
            users: UserService::new(db.clone(), reports.clone()),
            catalog: CatalogService::new(db.clone()),
            bookings: BookingService::new(db.clone(), &booking_config)
                .expect("default booking config is valid"),
            settlement: SettlementService::new(db.clone(), retry),
            transactions: TransactionService::new(db.clone(), booking_config.default_page_size),
            reports,
            reconciliation: ReconciliationService::new(db.clone()),
            db,
        }
    }

    pub async fn vendor(&self) -> users::Model {
        self.auth
            .ensure_vendor(&VendorConfig {
                name: "Frulo Studio".into(),
                email: VENDOR_EMAIL.into(),
                password: VENDOR_PASSWORD.into(),
            })
            .await
            .expect("vendor bootstrap failed")
    }

    /// 注册但不验证邮箱
    pub async fn register_customer(&self, email: &str) -> Uuid {
        self.auth
            .register(RegisterRequest {
                name: "Test Customer".into(),
                email: email.into(),
                password: CUSTOMER_PASSWORD.into(),
            })
            .await
            .expect("registration failed")
            .user_id
    }

    /// 读取日志中"发送"的验证令牌
    pub async fn verification_token(&self, email: &str) -> String {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .unwrap()
            .and_then(|u| u.verification_token)
            .expect("no pending verification token")
    }

    /// 注册并完成邮箱验证的顾客
    pub async fn customer(&self, email: &str) -> Uuid {
        let id = self.register_customer(email).await;
        let token = self.verification_token(email).await;
        self.auth
            .verify_email(VerifyEmailRequest {
                email: email.into(),
                token,
            })
            .await
            .expect("verification failed");
        id
    }

    pub async fn service(&self, vendor_id: Uuid, name: &str, price: i64) -> ServiceResponse {
        self.catalog
            .create_service(
                vendor_id,
                CreateServiceRequest {
                    name: name.into(),
                    price,
                },
            )
            .await
            .expect("service creation failed")
    }

    pub async fn user(&self, id: Uuid) -> users::Model {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .unwrap()
            .expect("user missing")
    }
}

/// 2030 年 6 月的某天某时 (UTC)
pub fn slot_time(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, day, hour, 30, 0).unwrap()
}
