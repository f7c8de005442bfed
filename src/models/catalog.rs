use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::catalog_service_entity;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    #[schema(example = "Haircut")]
    pub name: String,
    /// 价格（奈拉）
    #[schema(example = 5000)]
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl From<catalog_service_entity::Model> for ServiceResponse {
    fn from(m: catalog_service_entity::Model) -> Self {
        Self {
            id: m.id,
            vendor_id: m.vendor_id,
            name: m.name,
            price: m.price,
            created_at: m.created_at,
        }
    }
}
