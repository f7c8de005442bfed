use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    BookingStatus, IssueKind, TransactionStatus, booking_entity as bookings,
    slot_reservation_entity as slots, transaction_entity as transactions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{Decision, SettlementOutcome};
use crate::services::reconciliation_service::{NewIssue, record_issue};
use crate::utils::RetryPolicy;

/// 审批结算
///
/// 一次审批在单个数据库事务内完成：预约状态、交易状态、顾客与商家余额
/// 要么全部生效，要么全部回滚。状态以 `status = pending` 条件更新，
/// 重复提交同一决定不会重复入账，因此可以安全地对瞬时错误重试。
#[derive(Clone)]
pub struct SettlementService {
    pool: DatabaseConnection,
    retry: RetryPolicy,
}

impl SettlementService {
    pub fn new(pool: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub async fn decide(
        &self,
        booking_id: Uuid,
        decision: Decision,
        vendor_id: Uuid,
    ) -> AppResult<SettlementOutcome> {
        let started = Utc::now();
        let mut attempts = 0u32;
        let result = self
            .retry
            .run("booking decision", move || {
                // 之前的尝试可能在超时前已经提交
                let retried_since = (attempts > 0).then_some(started);
                attempts += 1;
                self.decide_once(booking_id, decision, vendor_id, retried_since)
            })
            .await;

        // 事务已回滚，问题记录走连接池
        if let Err(AppError::Consistency(detail)) = &result {
            let issue = NewIssue {
                kind: IssueKind::SettlementAborted,
                user_id: None,
                booking_id: Some(booking_id),
                expected: None,
                actual: None,
                detail: format!("{decision:?} by vendor {vendor_id} aborted: {detail}"),
            };
            if let Err(e) = record_issue(&self.pool, issue).await {
                log::error!("Failed to record settlement issue for booking {booking_id}: {e}");
            }
        }

        result
    }

    async fn decide_once(
        &self,
        booking_id: Uuid,
        decision: Decision,
        vendor_id: Uuid,
        retried_since: Option<DateTime<Utc>>,
    ) -> AppResult<SettlementOutcome> {
        let target = decision.target_status();

        let vendor = users::Entity::find_by_id(vendor_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor not found".into()))?;
        if !vendor.is_vendor() {
            return Err(AppError::Forbidden);
        }

        let txn = self.pool.begin().await?;
        match Self::apply(&txn, booking_id, target, vendor_id, retried_since).await {
            Ok(outcome) => {
                txn.commit().await?;
                if !outcome.already_applied {
                    log::info!(
                        "Booking {booking_id} {target} by vendor {vendor_id} (price={})",
                        outcome.booking.price
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rb) = txn.rollback().await {
                    log::warn!("Rollback of decision on booking {booking_id} failed: {rb}");
                }
                Err(e)
            }
        }
    }

    async fn apply<C: ConnectionTrait>(
        txn: &C,
        booking_id: Uuid,
        target: BookingStatus,
        vendor_id: Uuid,
        retried_since: Option<DateTime<Utc>>,
    ) -> AppResult<SettlementOutcome> {
        let now = Utc::now();

        // 状态条件更新是事务的第一条语句
        let updated = bookings::Entity::update_many()
            .col_expr(bookings::Column::Status, Expr::value(target))
            .col_expr(bookings::Column::DecidedBy, Expr::value(Some(vendor_id)))
            .col_expr(bookings::Column::UpdatedAt, Expr::value(now))
            .filter(bookings::Column::Id.eq(booking_id))
            .filter(bookings::Column::Status.eq(BookingStatus::Pending))
            .exec(txn)
            .await?;

        if updated.rows_affected == 0 {
            let current = bookings::Entity::find_by_id(booking_id)
                .one(txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;
            let tx = transactions::Entity::find()
                .filter(transactions::Column::BookingId.eq(booking_id))
                .one(txn)
                .await?;
            return Self::already_decided(current, tx, target, vendor_id, retried_since);
        }

        let booking = bookings::Entity::find_by_id(booking_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

        let tx = transactions::Entity::find()
            .filter(transactions::Column::BookingId.eq(booking_id))
            .one(txn)
            .await?
            .ok_or_else(|| {
                AppError::Consistency(format!("booking {booking_id} has no transaction"))
            })?;
        if tx.status != TransactionStatus::Initiated {
            return Err(AppError::Consistency(format!(
                "transaction {} of pending booking {booking_id} is already {}",
                tx.id, tx.status
            )));
        }

        let tx = match target {
            BookingStatus::Approved => {
                if tx.price != booking.price {
                    return Err(AppError::Consistency(format!(
                        "transaction {} price {} does not match booking {booking_id} price {}",
                        tx.id, tx.price, booking.price
                    )));
                }

                let mut am = tx.into_active_model();
                am.status = Set(TransactionStatus::Approved);
                am.updated_at = Set(now);
                let tx = am.update(txn).await?;

                Self::credit(txn, booking.user_id, booking.price, "customer").await?;
                Self::credit(txn, vendor_id, booking.price, "vendor").await?;
                tx
            }
            _ => {
                let mut am = tx.into_active_model();
                am.status = Set(TransactionStatus::Failed);
                am.updated_at = Set(now);
                let tx = am.update(txn).await?;

                // 被拒绝的时段重新开放
                slots::Entity::delete_many()
                    .filter(slots::Column::BookingId.eq(booking_id))
                    .exec(txn)
                    .await?;
                tx
            }
        };

        Ok(SettlementOutcome {
            booking: booking.into(),
            transaction: Some(tx.into()),
            already_applied: false,
        })
    }

    async fn credit<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        amount: i64,
        who: &str,
    ) -> AppResult<()> {
        let res = users::Entity::update_many()
            .col_expr(
                users::Column::TotalPayment,
                Expr::col(users::Column::TotalPayment).add(amount),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        if res.rows_affected != 1 {
            return Err(AppError::Consistency(format!(
                "{who} {user_id} missing while crediting {amount}"
            )));
        }
        Ok(())
    }

    /// 预约已是终态：相同决定视为已生效，相反决定为非法转换
    fn already_decided(
        booking: bookings::Model,
        tx: Option<transactions::Model>,
        target: BookingStatus,
        vendor_id: Uuid,
        retried_since: Option<DateTime<Utc>>,
    ) -> AppResult<SettlementOutcome> {
        if booking.status != target {
            return Err(AppError::InvalidState(format!(
                "Booking is already {}, cannot change it to {target}",
                booking.status
            )));
        }

        let applied_here = applied_by_earlier_attempt(&booking, vendor_id, retried_since);
        if applied_here {
            log::info!(
                "Booking {} was {} by an earlier attempt of this decision",
                booking.id,
                booking.status
            );
        } else {
            log::info!(
                "Booking {} already {}, decision ignored",
                booking.id,
                booking.status
            );
        }

        Ok(SettlementOutcome {
            booking: booking.into(),
            transaction: tx.map(Into::into),
            already_applied: !applied_here,
        })
    }
}

/// 超时的尝试可能已经提交：若预约由同一商家在本次调用开始之后决定，
/// 视为本次调用生效。仅在发生过重试时判断；同一商家并发提交同一决定
/// 且恰好发生重试时，两次调用都可能报告为本次生效。
fn applied_by_earlier_attempt(
    booking: &bookings::Model,
    vendor_id: Uuid,
    retried_since: Option<DateTime<Utc>>,
) -> bool {
    match retried_since {
        Some(since) => booking.decided_by == Some(vendor_id) && booking.updated_at >= since,
        None => false,
    }
}
