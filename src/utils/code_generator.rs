use rand::Rng;
use rand::distributions::Alphanumeric;

/// 生成邮箱验证令牌（32 位字母数字）
pub fn generate_verification_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
