use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::BookingService;

#[utoipa::path(
    post,
    path = "/bookings",
    tag = "booking",
    request_body = ReserveBookingRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "预约成功，等待商家审批", body = BookingResponse),
        (status = 400, description = "预约时间无效"),
        (status = 404, description = "服务不存在"),
        (status = 409, description = "时段已被占用")
    )
)]
pub async fn reserve_booking(
    booking_service: web::Data<BookingService>,
    user: AuthUser,
    request: web::Json<ReserveBookingRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_customer() {
        return Ok(e.error_response());
    }
    let request = request.into_inner();
    match booking_service
        .reserve(user.id, request.service_id, request.scheduled_at)
        .await
    {
        Ok(booking) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": booking
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/bookings/mine",
    tag = "booking",
    params(
        ("cursor" = Option<Uuid>, Query, description = "上一页最后一条预约的ID"),
        ("limit" = Option<u64>, Query, description = "每页数量，默认 10")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "我的预约，最新在前"),
        (status = 400, description = "游标无效")
    )
)]
pub async fn list_my_bookings(
    booking_service: web::Data<BookingService>,
    user: AuthUser,
    query: web::Query<CursorParams>,
) -> Result<HttpResponse> {
    match booking_service.list_by_user(user.id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "booking",
    params(
        ("id" = Uuid, Path, description = "预约ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "预约详情", body = BookingResponse),
        (status = 403, description = "无权查看"),
        (status = 404, description = "预约不存在")
    )
)]
pub async fn get_booking(
    booking_service: web::Data<BookingService>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match booking_service
        .get_by_id(path.into_inner(), user.id, user.role)
        .await
    {
        Ok(booking) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": booking
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    tag = "booking",
    params(
        ("id" = Uuid, Path, description = "预约ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "预约已取消"),
        (status = 403, description = "只能取消自己的预约"),
        (status = 404, description = "预约不存在"),
        (status = 409, description = "预约已审批，无法取消")
    )
)]
pub async fn cancel_booking(
    booking_service: web::Data<BookingService>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match booking_service.cancel(path.into_inner(), user.id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Booking cancelled"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn booking_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(reserve_booking))
            .route("/mine", web::get().to(list_my_bookings))
            .route("/{id}", web::get().to(get_booking))
            .route("/{id}", web::delete().to(cancel_booking)),
    );
}
