use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use crate::entities::{BookingStatus, TransactionStatus};
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::{
    BookingService, ReconciliationService, ReportService, SettlementService, TransactionService,
    UserService,
};

#[utoipa::path(
    get,
    path = "/vendor/bookings",
    tag = "vendor",
    params(
        ("status" = Option<BookingStatus>, Query, description = "按状态过滤"),
        ("page" = Option<u64>, Query, description = "页码"),
        ("per_page" = Option<u64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "全部预约"),
        (status = 403, description = "仅限商家")
    )
)]
pub async fn list_bookings(
    booking_service: web::Data<BookingService>,
    user: AuthUser,
    query: web::Query<BookingQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match booking_service.list_all(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/vendor/bookings/{id}/decision",
    tag = "vendor",
    params(
        ("id" = Uuid, Path, description = "预约ID")
    ),
    request_body = DecisionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "审批已生效（重复提交返回 already_applied）", body = SettlementOutcome),
        (status = 403, description = "仅限商家"),
        (status = 404, description = "预约不存在"),
        (status = 409, description = "预约已是相反的终态"),
        (status = 500, description = "数据不一致，已记录"),
        (status = 503, description = "暂时不可用，请重试")
    )
)]
pub async fn decide_booking(
    settlement_service: web::Data<SettlementService>,
    user: AuthUser,
    path: web::Path<Uuid>,
    request: web::Json<DecisionRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match settlement_service
        .decide(path.into_inner(), request.decision, user.id)
        .await
    {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": outcome
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendor/transactions",
    tag = "vendor",
    params(
        ("status" = Option<TransactionStatus>, Query, description = "按状态过滤"),
        ("page" = Option<u64>, Query, description = "页码"),
        ("per_page" = Option<u64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "全部交易"),
        (status = 403, description = "仅限商家")
    )
)]
pub async fn list_transactions(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    query: web::Query<TransactionQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match transaction_service.list_all(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendor/clients",
    tag = "vendor",
    params(
        ("page" = Option<u64>, Query, description = "页码"),
        ("per_page" = Option<u64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "客户列表"),
        (status = 403, description = "仅限商家")
    )
)]
pub async fn list_clients(
    user_service: web::Data<UserService>,
    user: AuthUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match user_service.list_clients(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendor/dashboard",
    tag = "vendor",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "看板统计", body = DashboardStats),
        (status = 403, description = "仅限商家")
    )
)]
pub async fn dashboard(
    report_service: web::Data<ReportService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match report_service.dashboard_stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stats
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/vendor/reconcile",
    tag = "vendor",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "对账完成", body = ReconciliationReport),
        (status = 403, description = "仅限商家")
    )
)]
pub async fn reconcile(
    reconciliation_service: web::Data<ReconciliationService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    log::info!("Manual reconciliation requested by vendor {}", user.id);
    match reconciliation_service.run().await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": report
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendor/consistency-issues",
    tag = "vendor",
    params(
        ("resolved" = Option<bool>, Query, description = "按是否已解决过滤"),
        ("page" = Option<u64>, Query, description = "页码"),
        ("per_page" = Option<u64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "数据不一致记录"),
        (status = 403, description = "仅限商家")
    )
)]
pub async fn list_consistency_issues(
    reconciliation_service: web::Data<ReconciliationService>,
    user: AuthUser,
    query: web::Query<ConsistencyIssueQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match reconciliation_service.list_issues(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/vendor/consistency-issues/{id}/resolve",
    tag = "vendor",
    params(
        ("id" = Uuid, Path, description = "问题ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已标记为解决", body = ConsistencyIssueResponse),
        (status = 403, description = "仅限商家"),
        (status = 404, description = "问题不存在")
    )
)]
pub async fn resolve_consistency_issue(
    reconciliation_service: web::Data<ReconciliationService>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_vendor() {
        return Ok(e.error_response());
    }
    match reconciliation_service.resolve_issue(path.into_inner()).await {
        Ok(issue) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": issue
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn vendor_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/vendor")
            .route("/bookings", web::get().to(list_bookings))
            .route("/bookings/{id}/decision", web::post().to(decide_booking))
            .route("/transactions", web::get().to(list_transactions))
            .route("/clients", web::get().to(list_clients))
            .route("/dashboard", web::get().to(dashboard))
            .route("/reconcile", web::post().to(reconcile))
            .route("/consistency-issues", web::get().to(list_consistency_issues))
            .route(
                "/consistency-issues/{id}/resolve",
                web::post().to(resolve_consistency_issue),
            ),
    );
}
