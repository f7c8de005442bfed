pub mod auth_service;
pub mod booking_service;
pub mod catalog_service;
pub mod reconciliation_service;
pub mod report_service;
pub mod settlement_service;
pub mod transaction_service;
pub mod user_service;

pub use auth_service::*;
pub use booking_service::*;
pub use catalog_service::*;
pub use reconciliation_service::*;
pub use report_service::*;
pub use settlement_service::*;
pub use transaction_service::*;
pub use user_service::*;
