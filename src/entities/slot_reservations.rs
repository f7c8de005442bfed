use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 时段占用记录
/// 说明:
/// - (service_id, slot_key) 为联合主键，插入冲突即表示时段已被占用
/// - 预约被拒绝或取消时删除，时段重新可约
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "slot_reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub service_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub slot_key: String,
    pub booking_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
