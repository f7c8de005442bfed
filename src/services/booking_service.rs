use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::entities::{
    BookingStatus, TransactionStatus, UserRole, booking_entity as bookings,
    catalog_service_entity as services, slot_reservation_entity as slots,
    transaction_entity as transactions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    BookingQuery, BookingResponse, CursorPage, CursorParams, PaginatedResponse, PaginationParams,
};
use crate::utils::{RetryPolicy, SlotKey, SlotPolicy};

pub const SLOT_UNAVAILABLE: &str = "slot unavailable, pick another time";

#[derive(Clone)]
pub struct BookingService {
    pool: DatabaseConnection,
    slot_policy: SlotPolicy,
    default_page_size: u64,
    retry: RetryPolicy,
}

impl BookingService {
    pub fn new(pool: DatabaseConnection, config: &BookingConfig) -> AppResult<Self> {
        let slot_policy = config.slot_policy().map_err(AppError::ConfigError)?;
        Ok(Self {
            pool,
            slot_policy,
            default_page_size: config.default_page_size,
            retry: config.retry_policy(),
        })
    }

    pub fn slot_policy(&self) -> SlotPolicy {
        self.slot_policy
    }

    /// 预约时段
    ///
    /// 先校验服务与顾客（必须是已验证邮箱的顾客），然后在同一事务内:
    /// 1. 计算时段键并 insert-if-absent 到 slot_reservations，冲突即时段已被占用
    /// 2. 写入 pending 预约与 initiated 交易
    /// 3. 顾客 bookings +1，记录 last_booking_id
    ///
    /// 占位插入是事务的第一条语句，事务从一开始就持有写锁。
    /// 不经过重试：插入不是幂等操作。
    pub async fn reserve(
        &self,
        customer_id: Uuid,
        service_id: Uuid,
        scheduled_at: DateTime<Utc>,
    ) -> AppResult<BookingResponse> {
        let now = Utc::now();
        if scheduled_at <= now {
            return Err(AppError::ValidationError(
                "Booking time must be in the future".into(),
            ));
        }

        let service = services::Entity::find_by_id(service_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

        let customer = users::Entity::find_by_id(customer_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if customer.role != UserRole::Customer {
            return Err(AppError::Forbidden);
        }
        if !customer.email_verified {
            return Err(AppError::AuthError("please verify your email".into()));
        }

        let slot_key = SlotKey::derive(scheduled_at, self.slot_policy);
        let booking_id = Uuid::new_v4();

        let txn = self.pool.begin().await?;

        let claimed = slots::Entity::insert(slots::ActiveModel {
            service_id: Set(service.id),
            slot_key: Set(slot_key.as_str().to_owned()),
            booking_id: Set(booking_id),
            created_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([slots::Column::ServiceId, slots::Column::SlotKey])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        if claimed == 0 {
            txn.rollback().await?;
            log::info!(
                "Slot {slot_key} of service {service_id} already taken, rejecting booking by {customer_id}"
            );
            return Err(AppError::Conflict(SLOT_UNAVAILABLE.into()));
        }

        let booking = bookings::ActiveModel {
            id: Set(booking_id),
            service_id: Set(service.id),
            user_id: Set(customer.id),
            slot_key: Set(slot_key.into_string()),
            scheduled_at: Set(scheduled_at),
            status: Set(BookingStatus::Pending),
            price: Set(service.price),
            decided_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking.id),
            user_id: Set(customer.id),
            price: Set(booking.price),
            status: Set(TransactionStatus::Initiated),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        users::Entity::update_many()
            .col_expr(
                users::Column::Bookings,
                Expr::col(users::Column::Bookings).add(1),
            )
            .col_expr(users::Column::LastBookingId, Expr::value(Some(booking.id)))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(customer.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        log::info!(
            "Booking {} reserved: service={} slot={} customer={}",
            booking.id,
            booking.service_id,
            booking.slot_key,
            booking.user_id
        );
        Ok(booking.into())
    }

    /// 查看单个预约，仅限预约本人或商家
    pub async fn get_by_id(
        &self,
        booking_id: Uuid,
        requester_id: Uuid,
        requester_role: UserRole,
    ) -> AppResult<BookingResponse> {
        let booking = self
            .retry
            .run("load booking", move || async move {
                bookings::Entity::find_by_id(booking_id)
                    .one(&self.pool)
                    .await
                    .map_err(AppError::from)
            })
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

        if requester_role != UserRole::Vendor && booking.user_id != requester_id {
            return Err(AppError::Forbidden);
        }
        Ok(booking.into())
    }

    /// 顾客自己的预约，按 created_at DESC, id DESC 游标分页
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        params: &CursorParams,
    ) -> AppResult<CursorPage<BookingResponse>> {
        let limit = params.get_limit(self.default_page_size);
        let mut query = bookings::Entity::find().filter(bookings::Column::UserId.eq(user_id));

        if let Some(cursor) = params.cursor {
            let anchor = bookings::Entity::find_by_id(cursor)
                .filter(bookings::Column::UserId.eq(user_id))
                .one(&self.pool)
                .await?
                .ok_or_else(|| {
                    AppError::ValidationError(
                        "Cursor no longer valid, restart from the first page".into(),
                    )
                })?;
            query = query.filter(
                Condition::any()
                    .add(bookings::Column::CreatedAt.lt(anchor.created_at))
                    .add(
                        Condition::all()
                            .add(bookings::Column::CreatedAt.eq(anchor.created_at))
                            .add(bookings::Column::Id.lt(anchor.id)),
                    ),
            );
        }

        let rows = query
            .order_by_desc(bookings::Column::CreatedAt)
            .order_by_desc(bookings::Column::Id)
            .limit(limit + 1)
            .all(&self.pool)
            .await?;

        Ok(CursorPage::from_rows(rows, limit, |m| m.id, Into::into))
    }

    /// 某服务的预约（商家）
    pub async fn list_by_service(
        &self,
        service_id: Uuid,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<BookingResponse>> {
        services::Entity::find_by_id(service_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

        let base = bookings::Entity::find().filter(bookings::Column::ServiceId.eq(service_id));
        let total = base.clone().count(&self.pool).await?;
        let rows = base
            .order_by_desc(bookings::Column::ScheduledAt)
            .order_by_desc(bookings::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }

    /// 全部预约（商家），可按状态过滤
    pub async fn list_all(&self, query: &BookingQuery) -> AppResult<PaginatedResponse<BookingResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base = bookings::Entity::find();
        if let Some(status) = query.status {
            base = base.filter(bookings::Column::Status.eq(status));
        }

        let total = base.clone().count(&self.pool).await?;
        let rows = base
            .order_by_desc(bookings::Column::CreatedAt)
            .order_by_desc(bookings::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    /// 取消预约
    ///
    /// 仅预约本人、仅 pending 状态可取消。预约、交易与时段占用一并删除，
    /// 顾客 bookings -1，全部在同一事务内完成。
    pub async fn cancel(&self, booking_id: Uuid, customer_id: Uuid) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        // 以 owner + status 条件删除，与审批竞争时以此为准
        let deleted = bookings::Entity::delete_many()
            .filter(bookings::Column::Id.eq(booking_id))
            .filter(bookings::Column::UserId.eq(customer_id))
            .filter(bookings::Column::Status.eq(BookingStatus::Pending))
            .exec(&txn)
            .await?;

        if deleted.rows_affected == 0 {
            let booking = bookings::Entity::find_by_id(booking_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;
            if booking.user_id != customer_id {
                return Err(AppError::Forbidden);
            }
            return Err(AppError::InvalidState(format!(
                "Only pending bookings can be cancelled, this one is {}",
                booking.status
            )));
        }

        transactions::Entity::delete_many()
            .filter(transactions::Column::BookingId.eq(booking_id))
            .exec(&txn)
            .await?;

        slots::Entity::delete_many()
            .filter(slots::Column::BookingId.eq(booking_id))
            .exec(&txn)
            .await?;

        users::Entity::update_many()
            .col_expr(
                users::Column::Bookings,
                Expr::col(users::Column::Bookings).sub(1),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(customer_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        log::info!("Booking {booking_id} cancelled by customer {customer_id}");
        Ok(())
    }
}
