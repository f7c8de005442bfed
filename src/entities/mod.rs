pub mod bookings;
pub mod catalog_services;
pub mod consistency_issues;
pub mod slot_reservations;
pub mod transactions;
pub mod users;

pub use bookings as booking_entity;
pub use catalog_services as catalog_service_entity;
pub use consistency_issues as consistency_issue_entity;
pub use slot_reservations as slot_reservation_entity;
pub use transactions as transaction_entity;
pub use users as user_entity;

pub use bookings::BookingStatus;
pub use consistency_issues::IssueKind;
pub use transactions::TransactionStatus;
pub use users::UserRole;
