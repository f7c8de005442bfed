use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::{AuthService, UserService};

#[utoipa::path(
    get,
    path = "/user/profile",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取用户资料成功", body = ProfileResponse),
        (status = 401, description = "未授权"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    match user_service.get_profile(user.id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/user/account",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "账号已删除"),
        (status = 403, description = "商家账号不可删除"),
        (status = 409, description = "存在待审批预约")
    )
)]
pub async fn delete_account(
    auth_service: web::Data<AuthService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_customer() {
        return Ok(e.error_response());
    }
    match auth_service.delete_account(user.id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Account deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/profile", web::get().to(get_profile))
            .route("/account", web::delete().to(delete_account)),
    );
}
