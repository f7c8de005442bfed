use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{UserRole, user_entity};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ada Obi")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub total_payment: i64,
    pub bookings: i64,
    pub last_booking_id: Option<Uuid>,
    pub login_times: i64,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(m: user_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            role: m.role,
            email_verified: m.email_verified,
            total_payment: m.total_payment,
            bookings: m.bookings,
            last_booking_id: m.last_booking_id,
            login_times: m.login_times,
            last_seen: m.last_seen,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// 注册成功但邮箱尚未验证
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PendingVerificationResponse {
    pub user_id: Uuid,
    pub email: String,
    /// 超过该时间仍未验证，登录时账号会被删除
    pub verify_before: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct BookingStatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// 顾客个人主页
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub status_counts: BookingStatusCounts,
}

/// 商家查看的客户列表条目
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub total_payment: i64,
    pub bookings: i64,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for ClientResponse {
    fn from(m: user_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            email_verified: m.email_verified,
            total_payment: m.total_payment,
            bookings: m.bookings,
            last_seen: m.last_seen,
            created_at: m.created_at,
        }
    }
}
