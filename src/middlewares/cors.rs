use actix_cors::Cors;

/// 移动端 App 不受同源策略约束，主要用于 swagger 与本地调试
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
