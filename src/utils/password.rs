use bcrypt::{hash, verify};
use crate::error::{AppError, AppResult};

/// bcrypt 只使用前 72 字节
const MAX_PASSWORD_BYTES: usize = 72;

/// 验证密码强度：8-72 字节，至少包含一个字母和一个数字
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < 8 || password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::ValidationError(
            "Password must be between 8 and 72 characters".to_string(),
        ));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_letter || !has_digit {
        return Err(AppError::ValidationError(
            "Password must contain letters and digits".to_string(),
        ));
    }

    Ok(())
}

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    hash(password, cost).map_err(|e| AppError::InternalError(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("password verification failed: {e}")))
}
