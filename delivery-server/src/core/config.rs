use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::auth::jwt::{
    DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS, generate_secure_printable_jwt_secret,
};
use crate::core::{Result, ServerError};
use crate::orders::StatusPolicy;

/// 非开发环境下 JWT 密钥的最小长度
const MIN_SECRET_LEN: usize = 32;

/// 令牌有效期上限 (一年)
const MAX_TOKEN_AGE_SECS: i64 = 60 * 60 * 24 * 365;

/// 数据库文件名 (位于工作目录下)
const DATABASE_FILE: &str = "delivery.redb";

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库) |
/// | HTTP_HOST | 0.0.0.0 | 监听地址 |
/// | HTTP_PORT | 4000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | JWT_ACCESS_KEY | 开发环境随机 | 访问令牌密钥 |
/// | JWT_REFRESH_KEY | 开发环境随机 | 刷新令牌密钥 |
/// | JWT_ACCESS_TOKEN_AGE | 60*15 | 访问令牌有效期 (秒，可写乘法表达式) |
/// | JWT_REFRESH_TOKEN_AGE | 60*60*24*7 | 刷新令牌有效期 (秒) |
/// | JWT_ISSUER | delivery-server | 令牌签发者 |
/// | ORDER_STATUS_POLICY | linear | 订单状态迁移策略 |
/// | CORS_ORIGIN | 未设置 (任意来源) | 允许的跨域来源 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/delivery HTTP_PORT=8080 JWT_ACCESS_TOKEN_AGE="60*5" cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存放 redb 数据库
    pub work_dir: String,
    pub http_host: String,
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub jwt: JwtConfig,
    pub status_policy: StatusPolicy,
    pub cors_origin: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 非开发环境缺少 JWT 密钥时返回配置错误。
    pub fn from_env() -> Result<Self> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let status_policy = match std::env::var("ORDER_STATUS_POLICY") {
            Ok(v) => v.parse().map_err(ServerError::Config)?,
            Err(_) => StatusPolicy::default(),
        };

        let jwt = JwtConfig {
            access_secret: require_secret(
                "JWT_ACCESS_KEY",
                std::env::var("JWT_ACCESS_KEY").ok(),
                &environment,
            )?,
            refresh_secret: require_secret(
                "JWT_REFRESH_KEY",
                std::env::var("JWT_REFRESH_KEY").ok(),
                &environment,
            )?,
            access_ttl_secs: token_age_from_env("JWT_ACCESS_TOKEN_AGE", DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl_secs: token_age_from_env(
                "JWT_REFRESH_TOKEN_AGE",
                DEFAULT_REFRESH_TTL_SECS,
            ),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "delivery-server".into()),
        };

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_host: std::env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            environment,
            jwt,
            status_policy,
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
        })
    }

    /// 测试和演示用配置：随机密钥，不读取环境变量
    pub fn for_tests() -> Self {
        Self {
            work_dir: std::env::temp_dir()
                .join("delivery-server")
                .to_string_lossy()
                .into_owned(),
            http_host: "127.0.0.1".into(),
            http_port: 0,
            environment: "development".into(),
            jwt: JwtConfig::with_random_secrets(),
            status_policy: StatusPolicy::default(),
            cors_origin: None,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(DATABASE_FILE)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// 解析密钥：开发环境缺失时生成随机密钥，其他环境缺失或过短即报错
fn require_secret(name: &str, value: Option<String>, environment: &str) -> Result<String> {
    let development = environment == "development";
    match value.filter(|v| !v.is_empty()) {
        Some(v) if !development && v.len() < MIN_SECRET_LEN => Err(ServerError::Config(format!(
            "{name} must be at least {MIN_SECRET_LEN} characters in {environment} environment"
        ))),
        Some(v) => Ok(v),
        None if development => {
            tracing::warn!("{name} not set, using a random key (tokens will not survive restart)");
            Ok(generate_secure_printable_jwt_secret())
        }
        None => Err(ServerError::Config(format!(
            "{name} must be set in {environment} environment"
        ))),
    }
}

fn token_age_from_env(name: &str, default: i64) -> i64 {
    resolve_token_age(name, std::env::var(name).ok(), default)
}

/// 无效表达式回退到默认值，超过上限的截断到 [`MAX_TOKEN_AGE_SECS`]
fn resolve_token_age(name: &str, expr: Option<String>, default: i64) -> i64 {
    let Some(expr) = expr else {
        return default;
    };
    match parse_token_age(&expr) {
        0 => {
            tracing::warn!("{name}={expr:?} is not a valid age, using {default}s");
            default
        }
        secs if secs > MAX_TOKEN_AGE_SECS => {
            tracing::warn!("{name}={expr:?} exceeds {MAX_TOKEN_AGE_SECS}s, capping");
            MAX_TOKEN_AGE_SECS
        }
        secs => secs,
    }
}

/// 解析有效期表达式，如 `"60*60*24"`
///
/// 各段必须是正整数，任一段无效或结果溢出时返回 0。
pub fn parse_token_age(expr: &str) -> i64 {
    expr.split('*')
        .map(|part| part.trim().parse::<i64>().ok().filter(|n| *n > 0))
        .try_fold(1i64, |acc, part| part.and_then(|n| acc.checked_mul(n)))
        .unwrap_or(0)
}
