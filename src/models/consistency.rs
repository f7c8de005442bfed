use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{IssueKind, consistency_issue_entity};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsistencyIssueResponse {
    pub id: Uuid,
    pub kind: IssueKind,
    pub user_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub expected: Option<i64>,
    pub actual: Option<i64>,
    pub detail: String,
    pub resolved: bool,
    pub detected_at: DateTime<Utc>,
}

impl From<consistency_issue_entity::Model> for ConsistencyIssueResponse {
    fn from(m: consistency_issue_entity::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            user_id: m.user_id,
            booking_id: m.booking_id,
            expected: m.expected,
            actual: m.actual,
            detail: m.detail,
            resolved: m.resolved,
            detected_at: m.detected_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ConsistencyIssueQuery {
    pub resolved: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// 一次对账扫描的结果
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReconciliationReport {
    pub users_checked: u64,
    pub bookings_checked: u64,
    /// 本次发现的全部问题（含此前已记录且未解决的）
    pub issues_found: u64,
    /// 本次新写入的问题
    pub issues_recorded: u64,
}
