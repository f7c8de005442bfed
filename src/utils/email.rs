use regex::Regex;
use std::sync::OnceLock;
use crate::error::{AppError, AppResult};

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
            .unwrap_or_else(|e| panic!("invalid email regex: {e}"))
    })
}

/// 规范化邮箱：去空白并转小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 验证邮箱格式
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.len() > 255 || !email_regex().is_match(email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@frulo.app").is_ok());
        assert!(validate_email("first.last+tag@mail.example.ng").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Frulo.APP "), "ada@frulo.app");
    }
}
