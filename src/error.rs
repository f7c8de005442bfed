use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    /// 时段已被占用
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 非法状态转换（例如取消已批准的预约）
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 网络/数据库暂时不可用，可重试
    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    /// 结算数据不一致，需要对账处理
    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the failure is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(e) => AppError::Transient(format!("connection acquire: {e}")),
            DbErr::Conn(e) => AppError::Transient(format!("connection: {e}")),
            other => AppError::DatabaseError(other),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                )
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    "Invalid token".to_string(),
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
            ),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                (
                    actix_web::http::StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    "Forbidden".to_string(),
                )
            }
            AppError::Conflict(msg) => (
                actix_web::http::StatusCode::CONFLICT,
                "SLOT_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::InvalidState(msg) => (
                actix_web::http::StatusCode::CONFLICT,
                "INVALID_STATE",
                msg.clone(),
            ),
            AppError::Transient(msg) => {
                log::warn!("Transient failure: {msg}");
                (
                    actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                    "TEMPORARILY_UNAVAILABLE",
                    "Service temporarily unavailable, please retry".to_string(),
                )
            }
            AppError::Consistency(msg) => {
                log::error!("Consistency error: {msg}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "CONSISTENCY_ERROR",
                    "The operation could not be completed and has been reported".to_string(),
                )
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Conflict("slot".into()).error_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidState("approved".into())
                .error_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Transient("db".into()).error_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::AuthError("bad".into()).error_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden.error_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(AppError::Transient("timeout".into()).is_transient());
        assert!(!AppError::Conflict("slot".into()).is_transient());
        assert!(!AppError::Consistency("drift".into()).is_transient());
    }

    #[test]
    fn test_db_connection_errors_are_transient() {
        let err: AppError = DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout).into();
        assert!(err.is_transient());
        let err: AppError = DbErr::Custom("boom".into()).into();
        assert!(!err.is_transient());
    }
}
