use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::config::{AuthConfig, VendorConfig};
use crate::entities::{BookingStatus, UserRole, booking_entity as bookings, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;

const MAX_NAME_CHARS: usize = 100;

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    config: AuthConfig,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService, config: AuthConfig) -> Self {
        Self {
            pool,
            jwt_service,
            config,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// 测试中使用较低的 bcrypt 成本
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    fn verification_window(&self) -> Duration {
        Duration::minutes(self.config.unverified_ttl_minutes)
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<PendingVerificationResponse> {
        let name = request.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::ValidationError(format!(
                "Name must be between 1 and {MAX_NAME_CHARS} characters"
            )));
        }
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        let exists = users::Entity::find()
            .filter(users::Column::Email.eq(email.clone()))
            .one(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(AppError::ValidationError("Email already registered".into()));
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;
        let token = generate_verification_token();
        let now = Utc::now();

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(UserRole::Customer),
            email_verified: Set(false),
            verification_token: Set(Some(token.clone())),
            total_payment: Set(0),
            bookings: Set(0),
            last_booking_id: Set(None),
            login_times: Set(0),
            last_seen: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await
        .map_err(map_unique_email)?;

        // 邮件发送不在本服务范围内，验证令牌输出到日志
        log::info!(
            "Verification token for {} (user {}): {token}",
            user.email,
            user.id
        );

        Ok(PendingVerificationResponse {
            user_id: user.id,
            email: user.email,
            verify_before: now + self.verification_window(),
        })
    }

    pub async fn verify_email(&self, request: VerifyEmailRequest) -> AppResult<UserResponse> {
        let email = normalize_email(&request.email);
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid verification token".into()))?;

        if user.email_verified {
            return Ok(user.into());
        }

        if user.created_at + self.verification_window() < Utc::now() {
            self.remove_expired(&user).await?;
            return Err(AppError::AuthError(
                "Verification window expired, the account was removed, please register again"
                    .into(),
            ));
        }

        if user.verification_token.as_deref() != Some(request.token.trim()) {
            return Err(AppError::AuthError("Invalid verification token".into()));
        }

        let mut am = user.into_active_model();
        am.email_verified = Set(true);
        am.verification_token = Set(None);
        am.updated_at = Set(Utc::now());
        let user = am.update(&self.pool).await?;

        log::info!("Email verified for user {}", user.id);
        Ok(user.into())
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".into()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".into()));
        }

        if !user.email_verified {
            if user.created_at + self.verification_window() < Utc::now() {
                self.remove_expired(&user).await?;
                return Err(AppError::AuthError(
                    "Email was not verified in time, the account was removed, please register again"
                        .into(),
                ));
            }
            return Err(AppError::AuthError("please verify your email".into()));
        }

        let now = Utc::now();
        users::Entity::update_many()
            .col_expr(
                users::Column::LoginTimes,
                Expr::col(users::Column::LoginTimes).add(1),
            )
            .col_expr(users::Column::LastSeen, Expr::value(Some(now)))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user.id))
            .exec(&self.pool)
            .await?;

        let user = users::Entity::find_by_id(user.id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        log::info!("User {} ({}) logged in", user.id, user.role);
        self.issue_tokens(user)
    }

    pub async fn refresh(&self, request: RefreshRequest) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(&request.refresh_token)?;
        let user_id = claims.user_id()?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Account no longer exists".into()))?;

        self.issue_tokens(user)
    }

    /// 顾客注销账号；存在待审批预约时拒绝
    pub async fn delete_account(&self, user_id: Uuid) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if user.is_vendor() {
            return Err(AppError::Forbidden);
        }

        let pending = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .filter(bookings::Column::Status.eq(BookingStatus::Pending))
            .count(&txn)
            .await?;
        if pending > 0 {
            return Err(AppError::InvalidState(format!(
                "Cancel your {pending} pending booking(s) before deleting the account"
            )));
        }

        users::Entity::delete_by_id(user_id).exec(&txn).await?;
        txn.commit().await?;

        log::info!("Account {user_id} deleted");
        Ok(())
    }

    /// 启动时确保商家账号存在
    pub async fn ensure_vendor(&self, vendor: &VendorConfig) -> AppResult<users::Model> {
        let email = normalize_email(&vendor.email);
        validate_email(&email)?;

        if let Some(existing) = users::Entity::find()
            .filter(users::Column::Email.eq(email.clone()))
            .one(&self.pool)
            .await?
        {
            if !existing.is_vendor() {
                return Err(AppError::ConfigError(format!(
                    "{email} is registered as a customer and cannot be the vendor"
                )));
            }
            return Ok(existing);
        }

        validate_password(&vendor.password)?;
        let now = Utc::now();
        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(vendor.name.clone()),
            email: Set(email),
            password_hash: Set(hash_password(&vendor.password, self.bcrypt_cost)?),
            role: Set(UserRole::Vendor),
            email_verified: Set(true),
            verification_token: Set(None),
            total_payment: Set(0),
            bookings: Set(0),
            last_booking_id: Set(None),
            login_times: Set(0),
            last_seen: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await
        .map_err(map_unique_email)?;

        log::info!("Vendor account {} created for {}", model.id, model.email);
        Ok(model)
    }

    /// 删除超过验证时限的未验证账号，返回删除数量
    pub async fn purge_unverified(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - self.verification_window();
        let res = users::Entity::delete_many()
            .filter(users::Column::EmailVerified.eq(false))
            .filter(users::Column::Role.eq(UserRole::Customer))
            .filter(users::Column::CreatedAt.lt(cutoff))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }

    async fn remove_expired(&self, user: &users::Model) -> AppResult<()> {
        users::Entity::delete_many()
            .filter(users::Column::Id.eq(user.id))
            .filter(users::Column::EmailVerified.eq(false))
            .exec(&self.pool)
            .await?;
        log::info!("Removed unverified account {} ({})", user.id, user.email);
        Ok(())
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user.id, user.role)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, user.role)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: user.into(),
        })
    }
}

fn map_unique_email(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::ValidationError("Email already registered".into())
        }
        _ => err.into(),
    }
}
