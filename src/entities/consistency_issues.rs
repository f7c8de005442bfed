use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// 用户 total_payment 与已批准预约金额之和不符
    #[sea_orm(string_value = "balance_drift")]
    BalanceDrift,
    /// 用户 bookings 计数与实际预约数量不符
    #[sea_orm(string_value = "booking_count_drift")]
    BookingCountDrift,
    /// 已批准预约缺少已批准交易，或金额不符
    #[sea_orm(string_value = "transaction_mismatch")]
    TransactionMismatch,
    /// 待审批预约没有对应的时段占用
    #[sea_orm(string_value = "missing_reservation")]
    MissingReservation,
    /// 审批过程中发现的不一致（事务已回滚）
    #[sea_orm(string_value = "settlement_aborted")]
    SettlementAborted,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::BalanceDrift => write!(f, "balance_drift"),
            IssueKind::BookingCountDrift => write!(f, "booking_count_drift"),
            IssueKind::TransactionMismatch => write!(f, "transaction_mismatch"),
            IssueKind::MissingReservation => write!(f, "missing_reservation"),
            IssueKind::SettlementAborted => write!(f, "settlement_aborted"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "consistency_issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: IssueKind,
    pub user_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub expected: Option<i64>,
    pub actual: Option<i64>,
    #[sea_orm(column_type = "Text")]
    pub detail: String,
    pub resolved: bool,
    pub detected_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
