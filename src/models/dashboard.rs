use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 商家看板，读取时通过聚合查询计算
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub services: i64,
    pub customers: i64,
    pub initiated_transactions: i64,
    /// 已批准交易金额合计
    pub approved_revenue: i64,
    /// 待审批交易金额合计
    pub initiated_revenue: i64,
}
