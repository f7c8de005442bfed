pub mod auth;
pub mod booking;
pub mod catalog;
pub mod transaction;
pub mod user;
pub mod vendor;

pub use auth::auth_config;
pub use booking::booking_config;
pub use catalog::catalog_config;
pub use transaction::transaction_config;
pub use user::user_config;
pub use vendor::vendor_config;
