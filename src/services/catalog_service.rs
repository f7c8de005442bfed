use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::{catalog_service_entity as services, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{CreateServiceRequest, ServiceResponse};

const MAX_NAME_CHARS: usize = 100;

/// 服务目录
///
/// 服务创建后不可修改，按 id 的读取走进程内缓存。列表每次都查询数据库，
/// 其他实例新建的服务立即可见。
#[derive(Clone)]
pub struct CatalogService {
    pool: DatabaseConnection,
    cache: Arc<RwLock<HashMap<Uuid, services::Model>>>,
}

impl CatalogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn list_services(&self) -> AppResult<Vec<ServiceResponse>> {
        let rows = services::Entity::find()
            .order_by_asc(services::Column::CreatedAt)
            .order_by_asc(services::Column::Id)
            .all(&self.pool)
            .await?;

        let mut cache = self.cache.write().await;
        for row in &rows {
            cache.entry(row.id).or_insert_with(|| row.clone());
        }

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_service(&self, id: Uuid) -> AppResult<ServiceResponse> {
        if let Some(hit) = self.cache.read().await.get(&id) {
            return Ok(hit.clone().into());
        }

        let model = services::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".into()))?;

        self.cache.write().await.insert(id, model.clone());
        Ok(model.into())
    }

    pub async fn create_service(
        &self,
        vendor_id: Uuid,
        request: CreateServiceRequest,
    ) -> AppResult<ServiceResponse> {
        let name = request.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::ValidationError(format!(
                "Service name must be between 1 and {MAX_NAME_CHARS} characters"
            )));
        }
        if request.price <= 0 {
            return Err(AppError::ValidationError(
                "Service price must be greater than zero".into(),
            ));
        }

        let vendor = users::Entity::find_by_id(vendor_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if !vendor.is_vendor() {
            return Err(AppError::Forbidden);
        }

        let model = services::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor.id),
            name: Set(name),
            price: Set(request.price),
            created_at: Set(Utc::now()),
        }
        .insert(&self.pool)
        .await?;

        self.cache.write().await.insert(model.id, model.clone());
        log::info!(
            "Service {} created: {} at {}",
            model.id,
            model.name,
            model.price
        );
        Ok(model.into())
    }
}
