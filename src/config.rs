use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::utils::{RetryPolicy, SlotPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub vendor: Option<VendorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 未验证邮箱的账号超过该时长后登录即删除（分钟）
    pub unverified_ttl_minutes: i64,
    /// 清理过期未验证账号的间隔（秒）
    pub purge_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            unverified_ttl_minutes: 5,
            purge_interval_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// 时段宽度（小时），必须整除 24
    pub slot_width_hours: u32,
    pub default_page_size: u64,
    pub retry_max_attempts: usize,
    pub retry_initial_delay_ms: u64,
    pub attempt_timeout_ms: u64,
    pub reconcile_interval_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_width_hours: 1,
            default_page_size: 10,
            retry_max_attempts: 3,
            retry_initial_delay_ms: 100,
            attempt_timeout_ms: 5_000,
            reconcile_interval_secs: 900,
        }
    }
}

impl BookingConfig {
    pub fn slot_policy(&self) -> Result<SlotPolicy, String> {
        SlotPolicy::new(self.slot_width_hours)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.retry_max_attempts)
            .initial_delay(Duration::from_millis(self.retry_initial_delay_ms))
            .attempt_timeout(Duration::from_millis(self.attempt_timeout_ms))
            .build()
    }
}

/// 单一商家账号，启动时若不存在则创建
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("failed to parse config: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;

                let vendor = match (get_env("VENDOR_EMAIL"), get_env("VENDOR_PASSWORD")) {
                    (Some(email), Some(password)) => Some(VendorConfig {
                        name: get_env("VENDOR_NAME").unwrap_or_else(|| "Vendor".to_string()),
                        email,
                        password,
                    }),
                    _ => None,
                };

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                        connect_timeout_secs: get_env_parse(
                            "DB_CONNECT_TIMEOUT_SECS",
                            default_connect_timeout_secs(),
                        ),
                        acquire_timeout_secs: get_env_parse(
                            "DB_ACQUIRE_TIMEOUT_SECS",
                            default_acquire_timeout_secs(),
                        ),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    auth: AuthConfig::default(),
                    booking: BookingConfig::default(),
                    vendor,
                }
            }
            Err(e) => {
                return Err(format!("cannot read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("UNVERIFIED_TTL_MINUTES")
            && let Ok(n) = v.parse()
        {
            config.auth.unverified_ttl_minutes = n;
        }
        if let Ok(v) = env::var("SLOT_WIDTH_HOURS")
            && let Ok(n) = v.parse()
        {
            config.booking.slot_width_hours = n;
        }
        if let Ok(v) = env::var("RECONCILE_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            config.booking.reconcile_interval_secs = n;
        }

        // 启动前校验时段宽度
        config.booking.slot_policy()?;

        Ok(config)
    }
}
