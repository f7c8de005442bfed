pub mod code_generator;
pub mod email;
pub mod jwt;
pub mod password;
pub mod retry;
pub mod slot_key;

pub use code_generator::generate_verification_token;
pub use email::{normalize_email, validate_email};
pub use jwt::*;
pub use password::*;
pub use retry::{RetryPolicy, RetryPolicyBuilder};
pub use slot_key::{SlotKey, SlotPolicy};
