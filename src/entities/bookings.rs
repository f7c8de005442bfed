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
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    /// Only `pending -> approved` and `pending -> rejected` are legal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Approved)
                | (BookingStatus::Pending, BookingStatus::Rejected)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Approved => write!(f, "approved"),
            BookingStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_id: Uuid,
    pub user_id: Uuid,
    /// "{hour}_{day}_{month}_{year}"，UTC
    pub slot_key: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub price: i64,
    /// 做出审批决定的商家
    pub decided_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_status_transitions() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Approved));
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Approved.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Rejected.can_transition_to(BookingStatus::Approved));
        assert!(!BookingStatus::Approved.can_transition_to(BookingStatus::Pending));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(BookingStatus::Approved.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
    }
}
