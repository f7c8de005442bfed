use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::time::Duration;

use frulo_booking::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to load configuration")?;

    // 创建数据库连接池并迁移
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database connection pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // 创建服务
    let retry = config.booking.retry_policy();
    let auth_service = AuthService::new(pool.clone(), jwt_service.clone(), config.auth.clone());
    let report_service = ReportService::new(pool.clone(), retry.clone());
    let user_service = UserService::new(pool.clone(), report_service.clone());
    let catalog_service = CatalogService::new(pool.clone());
    let booking_service = BookingService::new(pool.clone(), &config.booking)?;
    let settlement_service = SettlementService::new(pool.clone(), retry);
    let transaction_service =
        TransactionService::new(pool.clone(), config.booking.default_page_size);
    let reconciliation_service = ReconciliationService::new(pool.clone());

    match &config.vendor {
        Some(vendor) => {
            let vendor = auth_service
                .ensure_vendor(vendor)
                .await
                .context("Failed to bootstrap vendor account")?;
            log::info!("Vendor account ready: {}", vendor.email);
        }
        None => log::warn!("No [vendor] section configured, bookings cannot be approved"),
    }

    tasks::spawn_all(
        reconciliation_service.clone(),
        auth_service.clone(),
        Duration::from_secs(config.booking.reconcile_interval_secs),
        Duration::from_secs(config.auth.purge_interval_secs),
    );

    log::info!(
        "Starting HTTP server at {}:{} (slot width {}h)",
        config.server.host,
        config.server.port,
        booking_service.slot_policy().width_hours()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(booking_service.clone()))
            .app_data(web::Data::new(settlement_service.clone()))
            .app_data(web::Data::new(transaction_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .app_data(web::Data::new(reconciliation_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::catalog_config)
                    .configure(handlers::booking_config)
                    .configure(handlers::transaction_config)
                    .configure(handlers::vendor_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
