use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::{BookingService, CatalogService};

#[utoipa::path(
    get,
    path = "/services",
    tag = "catalog",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "服务列表", body = Vec<ServiceResponse>)
    )
)]
pub async fn list_services(catalog_service: web::Data<CatalogService>) -> Result<HttpResponse> {
    match catalog_service.list_services().await {
        Ok(services) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": services
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/services/{id}",
    tag = "catalog",
    params(
        ("id" = Uuid, Path, description = "服务ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "服务详情", body = ServiceResponse),
        (status = 404, description = "服务不存在")
    )
)]
pub async fn get_service(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match catalog_service.get_service(path.into_inner()).await {
        Ok(service) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": service
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/services",
    tag = "catalog",
    request_body = CreateServiceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "服务已创建", body = ServiceResponse),
        (status = 400, description = "名称或价格无效"),
        (status = 403, description = "仅限商家")
    )
)]
pub async fn create_service(
    catalog_service: web::Data<CatalogService>,
    user: AuthUser,
    request: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match catalog_service
        .create_service(user.id, request.into_inner())
        .await
    {
        Ok(service) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": service
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/services/{id}/bookings",
    tag = "catalog",
    params(
        ("id" = Uuid, Path, description = "服务ID"),
        ("page" = Option<u64>, Query, description = "页码"),
        ("per_page" = Option<u64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "该服务的预约"),
        (status = 403, description = "仅限商家"),
        (status = 404, description = "服务不存在")
    )
)]
pub async fn list_service_bookings(
    booking_service: web::Data<BookingService>,
    user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match booking_service
        .list_by_service(path.into_inner(), &query)
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/services")
            .route("", web::get().to(list_services))
            .route("", web::post().to(create_service))
            .route("/{id}", web::get().to(get_service))
            .route("/{id}/bookings", web::get().to(list_service_bookings)),
    );
}
