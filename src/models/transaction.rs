use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{TransactionStatus, transaction_entity};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub price: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(m: transaction_entity::Model) -> Self {
        Self {
            id: m.id,
            booking_id: m.booking_id,
            user_id: m.user_id,
            price: m.price,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TransactionQuery {
    pub status: Option<TransactionStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}
