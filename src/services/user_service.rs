use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{ClientResponse, PaginatedResponse, PaginationParams, ProfileResponse};
use crate::services::ReportService;

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
    report_service: ReportService,
}

impl UserService {
    pub fn new(pool: DatabaseConnection, report_service: ReportService) -> Self {
        Self {
            pool,
            report_service,
        }
    }

    /// 个人主页：余额、预约计数与各状态数量
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<ProfileResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let status_counts = match user.role {
            UserRole::Customer => self.report_service.booking_counts(Some(user.id)).await?,
            UserRole::Vendor => self.report_service.booking_counts(None).await?,
        };

        Ok(ProfileResponse {
            user: user.into(),
            status_counts,
        })
    }

    /// 客户列表（商家）
    pub async fn list_clients(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ClientResponse>> {
        let base = users::Entity::find().filter(users::Column::Role.eq(UserRole::Customer));

        let total = base.clone().count(&self.pool).await?;
        let rows = base
            .order_by_desc(users::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }
}
