//! Catalog reads stay in step with the database across instances.

mod common;

use common::TestApp;
use frulo_booking::error::AppError;
use frulo_booking::models::CreateServiceRequest;
use frulo_booking::services::CatalogService;
use uuid::Uuid;

#[tokio::test]
async fn test_other_instance_sees_new_services() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    app.service(vendor.id, "Haircut", 5_000).await;

    // 第二个实例共享同一数据库
    let other = CatalogService::new(app.db.clone());
    assert_eq!(other.list_services().await.unwrap().len(), 1);

    let massage = app.service(vendor.id, "Massage", 8_000).await;

    let listed = other.list_services().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].id, massage.id);
    assert_eq!(other.get_service(massage.id).await.unwrap().price, 8_000);
}

#[tokio::test]
async fn test_create_and_lookup() {
    let app = TestApp::new().await;
    let vendor = app.vendor().await;
    let nails = app.service(vendor.id, "  Nails  ", 3_000).await;
    assert_eq!(nails.name, "Nails");

    let fetched = app.catalog.get_service(nails.id).await.unwrap();
    assert_eq!(fetched.id, nails.id);

    let missing = app.catalog.get_service(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));

    let zero = app
        .catalog
        .create_service(
            vendor.id,
            CreateServiceRequest {
                name: "Free".into(),
                price: 0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(zero, AppError::ValidationError(_)));

    let customer = app.customer("pat@example.com").await;
    let denied = app
        .catalog
        .create_service(
            customer,
            CreateServiceRequest {
                name: "Nope".into(),
                price: 100,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(denied, AppError::Forbidden));
}
