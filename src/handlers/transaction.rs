use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::TransactionService;

#[utoipa::path(
    get,
    path = "/transactions/mine",
    tag = "transaction",
    params(
        ("cursor" = Option<uuid::Uuid>, Query, description = "上一页最后一条交易的ID"),
        ("limit" = Option<u64>, Query, description = "每页数量，默认 10")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "我的支付记录，最新在前"),
        (status = 400, description = "游标无效")
    )
)]
pub async fn list_my_transactions(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    query: web::Query<CursorParams>,
) -> Result<HttpResponse> {
    match transaction_service.list_by_user(user.id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn transaction_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions").route("/mine", web::get().to(list_my_transactions)),
    );
}
