use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{BookingStatus, booking_entity};
use crate::models::TransactionResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReserveBookingRequest {
    pub service_id: Uuid,
    /// RFC 3339，带时区偏移；服务端统一换算为 UTC
    #[schema(example = "2030-06-10T14:30:00+01:00")]
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub id: Uuid,
    pub service_id: Uuid,
    pub user_id: Uuid,
    pub slot_key: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub price: i64,
    pub decided_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<booking_entity::Model> for BookingResponse {
    fn from(m: booking_entity::Model) -> Self {
        Self {
            id: m.id,
            service_id: m.service_id,
            user_id: m.user_id,
            slot_key: m.slot_key,
            scheduled_at: m.scheduled_at,
            status: m.status,
            price: m.price,
            decided_by: m.decided_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target_status(self) -> BookingStatus {
        match self {
            Decision::Approve => BookingStatus::Approved,
            Decision::Reject => BookingStatus::Rejected,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionRequest {
    pub decision: Decision,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettlementOutcome {
    pub booking: BookingResponse,
    pub transaction: Option<TransactionResponse>,
    /// 重复提交相同决定时为 true，此时不会产生任何变更
    pub already_applied: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_target_status() {
        assert_eq!(Decision::Approve.target_status(), BookingStatus::Approved);
        assert_eq!(Decision::Reject.target_status(), BookingStatus::Rejected);
    }

    #[test]
    fn test_decision_wire_format() {
        let req: DecisionRequest = serde_json::from_str(r#"{"decision":"approve"}"#).unwrap();
        assert_eq!(req.decision, Decision::Approve);
        assert!(serde_json::from_str::<DecisionRequest>(r#"{"decision":"maybe"}"#).is_err());
    }

    #[test]
    fn test_scheduled_at_normalized_to_utc() {
        let req: ReserveBookingRequest = serde_json::from_str(
            r#"{"service_id":"6f1c1b5e-8f0e-4a8e-9a59-0d6f1a2b3c4d","scheduled_at":"2030-06-10T14:30:00+01:00"}"#,
        )
        .unwrap();
        assert_eq!(req.scheduled_at.to_rfc3339(), "2030-06-10T13:30:00+00:00");
    }
}
