use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::{
    BookingStatus, TransactionStatus, UserRole, booking_entity as bookings,
    catalog_service_entity as services, transaction_entity as transactions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{BookingStatusCounts, DashboardStats};
use crate::utils::RetryPolicy;

#[derive(Debug, FromQueryResult)]
struct BookingStatusRow {
    status: BookingStatus,
    count: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct TransactionStatusRow {
    status: TransactionStatus,
    count: Option<i64>,
    amount: Option<i64>,
}

/// 统计报表，全部在读取时通过聚合查询计算
#[derive(Clone)]
pub struct ReportService {
    pool: DatabaseConnection,
    retry: RetryPolicy,
}

impl ReportService {
    pub fn new(pool: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// 商家看板
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        self.retry
            .run("dashboard stats", || self.compute_dashboard())
            .await
    }

    async fn compute_dashboard(&self) -> AppResult<DashboardStats> {
        let mut stats = DashboardStats::default();

        let counts = self.booking_counts(None).await?;
        stats.pending = counts.pending;
        stats.approved = counts.approved;
        stats.rejected = counts.rejected;

        stats.services = services::Entity::find().count(&self.pool).await? as i64;
        stats.customers = users::Entity::find()
            .filter(users::Column::Role.eq(UserRole::Customer))
            .count(&self.pool)
            .await? as i64;

        let tx_rows = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Status)
            .column_as(Expr::col(transactions::Column::Id).count(), "count")
            .column_as(
                Expr::col(transactions::Column::Price)
                    .sum()
                    .cast_as(Alias::new("BIGINT")),
                "amount",
            )
            .group_by(transactions::Column::Status)
            .into_model::<TransactionStatusRow>()
            .all(&self.pool)
            .await?;

        for row in tx_rows {
            match row.status {
                TransactionStatus::Initiated => {
                    stats.initiated_transactions = row.count.unwrap_or(0);
                    stats.initiated_revenue = row.amount.unwrap_or(0);
                }
                TransactionStatus::Approved => {
                    stats.approved_revenue = row.amount.unwrap_or(0);
                }
                TransactionStatus::Failed => {}
            }
        }

        Ok(stats)
    }

    /// 各状态预约数量；传入 user_id 时只统计该顾客
    pub async fn booking_counts(&self, user_id: Option<Uuid>) -> AppResult<BookingStatusCounts> {
        let mut query = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::Status)
            .column_as(Expr::col(bookings::Column::Id).count(), "count")
            .group_by(bookings::Column::Status);
        if let Some(user_id) = user_id {
            query = query.filter(bookings::Column::UserId.eq(user_id));
        }

        let rows = query
            .into_model::<BookingStatusRow>()
            .all(&self.pool)
            .await
            .map_err(AppError::from)?;

        let mut counts = BookingStatusCounts::default();
        for row in rows {
            let n = row.count.unwrap_or(0);
            match row.status {
                BookingStatus::Pending => counts.pending = n,
                BookingStatus::Approved => counts.approved = n,
                BookingStatus::Rejected => counts.rejected = n,
            }
        }
        Ok(counts)
    }
}
