pub mod booking;
pub mod catalog;
pub mod common;
pub mod consistency;
pub mod dashboard;
pub mod pagination;
pub mod transaction;
pub mod user;

pub use booking::*;
pub use catalog::*;
pub use common::*;
pub use consistency::*;
pub use dashboard::*;
pub use pagination::*;
pub use transaction::*;
pub use user::*;
