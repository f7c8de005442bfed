use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{BookingStatus, IssueKind, TransactionStatus, UserRole};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::verify_email,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::user::delete_account,
        handlers::catalog::list_services,
        handlers::catalog::get_service,
        handlers::catalog::create_service,
        handlers::catalog::list_service_bookings,
        handlers::booking::reserve_booking,
        handlers::booking::list_my_bookings,
        handlers::booking::get_booking,
        handlers::booking::cancel_booking,
        handlers::transaction::list_my_transactions,
        handlers::vendor::list_bookings,
        handlers::vendor::decide_booking,
        handlers::vendor::list_transactions,
        handlers::vendor::list_clients,
        handlers::vendor::dashboard,
        handlers::vendor::reconcile,
        handlers::vendor::list_consistency_issues,
        handlers::vendor::resolve_consistency_issue,
    ),
    components(
        schemas(
            RegisterRequest,
            VerifyEmailRequest,
            LoginRequest,
            RefreshRequest,
            AuthResponse,
            PendingVerificationResponse,
            UserResponse,
            UserRole,
            BookingStatusCounts,
            ProfileResponse,
            ClientResponse,
            CreateServiceRequest,
            ServiceResponse,
            ReserveBookingRequest,
            BookingResponse,
            BookingStatus,
            Decision,
            DecisionRequest,
            SettlementOutcome,
            TransactionResponse,
            TransactionStatus,
            DashboardStats,
            ConsistencyIssueResponse,
            IssueKind,
            ReconciliationReport,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, email verification and sessions"),
        (name = "user", description = "Profile and account"),
        (name = "catalog", description = "Vendor service catalog"),
        (name = "booking", description = "Slot reservation and customer bookings"),
        (name = "transaction", description = "Customer payments"),
        (name = "vendor", description = "Approvals, reports and reconciliation"),
    ),
    info(
        title = "Frulo Booking API",
        version = "1.0.0",
        description = "Booking reservation and settlement REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
