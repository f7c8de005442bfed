use crate::entities::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use uuid::Uuid;

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            // 登录、注册、验证邮箱与刷新令牌均无需访问令牌
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/auth/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// 已通过认证的调用方，由 [`AuthMiddleware`] 写入请求扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn require_vendor(&self) -> AppResult<()> {
        match self.role {
            UserRole::Vendor => Ok(()),
            UserRole::Customer => Err(AppError::Forbidden),
        }
    }

    pub fn require_customer(&self) -> AppResult<()> {
        match self.role {
            UserRole::Customer => Ok(()),
            UserRole::Vendor => Err(AppError::Forbidden),
        }
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .copied()
                .ok_or_else(|| AppError::AuthError("Missing access token".to_string())),
        )
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS || self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        let verified = self
            .jwt_service
            .verify_access_token(token)
            .and_then(|claims| {
                Ok(AuthUser {
                    id: claims.user_id()?,
                    role: claims.role,
                })
            });

        match verified {
            Ok(user) => {
                req.extensions_mut().insert(user);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(e) => {
                log::debug!("Rejected access token: {e}");
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/api/v1/auth/login"));
        assert!(paths.is_public_path("/api/v1/auth/refresh"));
        assert!(paths.is_public_path("/swagger-ui/index.html"));
        assert!(!paths.is_public_path("/api/v1/bookings"));
        assert!(!paths.is_public_path("/api/v1/vendor/dashboard"));
    }

    #[test]
    fn test_role_guards() {
        let vendor = AuthUser {
            id: Uuid::new_v4(),
            role: UserRole::Vendor,
        };
        let customer = AuthUser {
            id: Uuid::new_v4(),
            role: UserRole::Customer,
        };
        assert!(vendor.require_vendor().is_ok());
        assert!(vendor.require_customer().is_err());
        assert!(customer.require_customer().is_ok());
        assert!(customer.require_vendor().is_err());
    }
}
