//! 对账
//!
//! 扫描用户余额、预约计数、交易与时段占用，发现的不一致写入
//! consistency_issues 并以 error 级别记录日志。同一对象、同一类型、
//! 同一组 expected/actual 的未解决问题只记录一次；商家处理后标记为已解决。

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::{
    BookingStatus, IssueKind, TransactionStatus, UserRole, booking_entity as bookings,
    consistency_issue_entity as issues, slot_reservation_entity as slots,
    transaction_entity as transactions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    ConsistencyIssueQuery, ConsistencyIssueResponse, PaginatedResponse, PaginationParams,
    ReconciliationReport,
};

/// 待记录的不一致问题
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub kind: IssueKind,
    pub user_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub expected: Option<i64>,
    pub actual: Option<i64>,
    pub detail: String,
}

/// 写入一条问题记录；若已有相同类型、相同对象、相同数值与描述的未解决记录则跳过。
/// 返回是否新写入。
pub async fn record_issue<C: ConnectionTrait>(db: &C, issue: NewIssue) -> AppResult<bool> {
    let mut existing = issues::Entity::find()
        .filter(issues::Column::Kind.eq(issue.kind))
        .filter(issues::Column::Resolved.eq(false));
    existing = match issue.user_id {
        Some(id) => existing.filter(issues::Column::UserId.eq(id)),
        None => existing.filter(issues::Column::UserId.is_null()),
    };
    existing = match issue.booking_id {
        Some(id) => existing.filter(issues::Column::BookingId.eq(id)),
        None => existing.filter(issues::Column::BookingId.is_null()),
    };
    existing = match issue.expected {
        Some(v) => existing.filter(issues::Column::Expected.eq(v)),
        None => existing.filter(issues::Column::Expected.is_null()),
    };
    existing = match issue.actual {
        Some(v) => existing.filter(issues::Column::Actual.eq(v)),
        None => existing.filter(issues::Column::Actual.is_null()),
    };
    existing = existing.filter(issues::Column::Detail.eq(issue.detail.clone()));

    if existing.one(db).await?.is_some() {
        return Ok(false);
    }

    log::error!(
        "Consistency issue [{}] user={:?} booking={:?} expected={:?} actual={:?}: {}",
        issue.kind,
        issue.user_id,
        issue.booking_id,
        issue.expected,
        issue.actual,
        issue.detail
    );

    issues::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(issue.kind),
        user_id: Set(issue.user_id),
        booking_id: Set(issue.booking_id),
        expected: Set(issue.expected),
        actual: Set(issue.actual),
        detail: Set(issue.detail),
        resolved: Set(false),
        detected_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    Ok(true)
}

#[derive(Debug, FromQueryResult)]
struct UserAmount {
    user_id: Uuid,
    amount: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct VendorAmount {
    decided_by: Uuid,
    amount: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct UserCount {
    user_id: Uuid,
    count: Option<i64>,
}

#[derive(Clone)]
pub struct ReconciliationService {
    pool: DatabaseConnection,
}

impl ReconciliationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 完整扫描一次
    pub async fn run(&self) -> AppResult<ReconciliationReport> {
        let mut found: Vec<NewIssue> = Vec::new();

        let customer_totals: HashMap<Uuid, i64> = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::UserId)
            .column_as(
                Expr::col(bookings::Column::Price)
                    .sum()
                    .cast_as(Alias::new("BIGINT")),
                "amount",
            )
            .filter(bookings::Column::Status.eq(BookingStatus::Approved))
            .group_by(bookings::Column::UserId)
            .into_model::<UserAmount>()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|row| (row.user_id, row.amount.unwrap_or(0)))
            .collect();

        let vendor_totals: HashMap<Uuid, i64> = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::DecidedBy)
            .column_as(
                Expr::col(bookings::Column::Price)
                    .sum()
                    .cast_as(Alias::new("BIGINT")),
                "amount",
            )
            .filter(bookings::Column::Status.eq(BookingStatus::Approved))
            .filter(bookings::Column::DecidedBy.is_not_null())
            .group_by(bookings::Column::DecidedBy)
            .into_model::<VendorAmount>()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|row| (row.decided_by, row.amount.unwrap_or(0)))
            .collect();

        let booking_counts: HashMap<Uuid, i64> = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::UserId)
            .column_as(Expr::col(bookings::Column::Id).count(), "count")
            .group_by(bookings::Column::UserId)
            .into_model::<UserCount>()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|row| (row.user_id, row.count.unwrap_or(0)))
            .collect();

        let all_users = users::Entity::find().all(&self.pool).await?;
        for user in &all_users {
            let expected_total = match user.role {
                UserRole::Customer => customer_totals.get(&user.id),
                UserRole::Vendor => vendor_totals.get(&user.id),
            }
            .copied()
            .unwrap_or(0);

            if user.total_payment != expected_total {
                found.push(NewIssue {
                    kind: IssueKind::BalanceDrift,
                    user_id: Some(user.id),
                    booking_id: None,
                    expected: Some(expected_total),
                    actual: Some(user.total_payment),
                    detail: format!(
                        "{} {} total_payment is {} but approved bookings sum to {}",
                        user.role, user.email, user.total_payment, expected_total
                    ),
                });
            }

            if user.role == UserRole::Customer {
                let expected_count = booking_counts.get(&user.id).copied().unwrap_or(0);
                if user.bookings != expected_count {
                    found.push(NewIssue {
                        kind: IssueKind::BookingCountDrift,
                        user_id: Some(user.id),
                        booking_id: None,
                        expected: Some(expected_count),
                        actual: Some(user.bookings),
                        detail: format!(
                            "customer {} has bookings={} but owns {} bookings",
                            user.email, user.bookings, expected_count
                        ),
                    });
                }
            }
        }

        let open_bookings = bookings::Entity::find()
            .filter(bookings::Column::Status.ne(BookingStatus::Rejected))
            .order_by_asc(bookings::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        let tx_by_booking: HashMap<Uuid, transactions::Model> = transactions::Entity::find()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|t| (t.booking_id, t))
            .collect();

        let reserved: HashSet<Uuid> = slots::Entity::find()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|s| s.booking_id)
            .collect();

        for booking in &open_bookings {
            if booking.status == BookingStatus::Approved {
                match tx_by_booking.get(&booking.id) {
                    Some(tx)
                        if tx.status == TransactionStatus::Approved && tx.price == booking.price => {}
                    Some(tx) => found.push(NewIssue {
                        kind: IssueKind::TransactionMismatch,
                        user_id: Some(booking.user_id),
                        booking_id: Some(booking.id),
                        expected: Some(booking.price),
                        actual: Some(tx.price),
                        detail: format!(
                            "approved booking has transaction {} in status {} with price {}",
                            tx.id, tx.status, tx.price
                        ),
                    }),
                    None => found.push(NewIssue {
                        kind: IssueKind::TransactionMismatch,
                        user_id: Some(booking.user_id),
                        booking_id: Some(booking.id),
                        expected: Some(booking.price),
                        actual: None,
                        detail: "approved booking has no transaction".into(),
                    }),
                }
            }

            if !reserved.contains(&booking.id) {
                found.push(NewIssue {
                    kind: IssueKind::MissingReservation,
                    user_id: Some(booking.user_id),
                    booking_id: Some(booking.id),
                    expected: None,
                    actual: None,
                    detail: format!(
                        "{} booking does not hold slot {} of service {}",
                        booking.status, booking.slot_key, booking.service_id
                    ),
                });
            }
        }

        let issues_found = found.len() as u64;
        let mut issues_recorded = 0;
        for issue in found {
            if record_issue(&self.pool, issue).await? {
                issues_recorded += 1;
            }
        }

        let report = ReconciliationReport {
            users_checked: all_users.len() as u64,
            bookings_checked: open_bookings.len() as u64,
            issues_found,
            issues_recorded,
        };
        log::info!(
            "Reconciliation finished: users={} bookings={} issues={} new={}",
            report.users_checked,
            report.bookings_checked,
            report.issues_found,
            report.issues_recorded
        );
        Ok(report)
    }

    pub async fn list_issues(
        &self,
        query: &ConsistencyIssueQuery,
    ) -> AppResult<PaginatedResponse<ConsistencyIssueResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base = issues::Entity::find();
        if let Some(resolved) = query.resolved {
            base = base.filter(issues::Column::Resolved.eq(resolved));
        }

        let total = base.clone().count(&self.pool).await?;
        let rows = base
            .order_by_desc(issues::Column::DetectedAt)
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

    /// 标记问题已处理；已解决的问题再次调用无副作用
    pub async fn resolve_issue(&self, issue_id: Uuid) -> AppResult<ConsistencyIssueResponse> {
        let issue = issues::Entity::find_by_id(issue_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Consistency issue not found".into()))?;
        if issue.resolved {
            return Ok(issue.into());
        }

        let mut am = issue.into_active_model();
        am.resolved = Set(true);
        let issue = am.update(&self.pool).await?;

        log::info!("Consistency issue {} [{}] resolved", issue.id, issue.kind);
        Ok(issue.into())
    }
}
