//! JWT 令牌服务
//!
//! 签发和验证访问令牌 (access) 与刷新令牌 (refresh)。两类令牌使用不同密钥
//! 和有效期，载荷都是四字段身份 (id, email, name, role)。

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use shared::client::TokenPair;
use shared::error::{AppError, ErrorCode};
use shared::models::{Identity, Role};
use thiserror::Error;

/// 默认访问令牌有效期 (15 分钟)
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 15;
/// 默认刷新令牌有效期 (7 天)
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 60 * 60 * 24 * 7;

/// JWT 配置
#[derive(Clone)]
pub struct JwtConfig {
    /// 访问令牌密钥 (应至少 32 字节)
    pub access_secret: String,
    /// 刷新令牌密钥 (应至少 32 字节，且与访问密钥不同)
    pub refresh_secret: String,
    /// 访问令牌有效期 (秒)
    pub access_ttl_secs: i64,
    /// 刷新令牌有效期 (秒)
    pub refresh_ttl_secs: i64,
    /// 令牌签发者
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    /// 使用随机密钥的配置 (开发环境和测试用)
    pub fn with_random_secrets() -> Self {
        Self {
            access_secret: generate_secure_printable_jwt_secret(),
            refresh_secret: generate_secure_printable_jwt_secret(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            issuer: "delivery-server".to_string(),
        }
    }
}

/// 令牌类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// 存储在令牌中的 JWT Claims
///
/// 身份字段带 `serde(default)`，缺失时解码为空值，由 [`JwtService::verify`]
/// 统一报告 [`JwtError::MissingClaims`]。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// 角色 (Customer | Delivery)
    #[serde(default)]
    pub role: String,
    /// 令牌类型 (access | refresh)
    #[serde(default)]
    pub token_type: String,
    /// 签发时间戳
    pub iat: i64,
    /// 过期时间戳
    pub exp: i64,
    /// 生效时间戳
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// 签发者
    pub iss: String,
}

/// JWT 错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("令牌已过期")]
    Expired,

    #[error("无效令牌: {0}")]
    Malformed(String),

    #[error("令牌尚未生效")]
    NotYetValid,

    #[error("令牌缺少身份字段")]
    MissingClaims,

    #[error("未知令牌错误: {0}")]
    Unknown(String),

    #[error("令牌生成失败: {0}")]
    Generation(String),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AppError::new(ErrorCode::TokenExpired),
            JwtError::Malformed(_) => AppError::new(ErrorCode::TokenInvalid),
            JwtError::NotYetValid => AppError::new(ErrorCode::TokenNotYetValid),
            JwtError::MissingClaims => AppError::new(ErrorCode::TokenMissingClaims),
            JwtError::Unknown(_) => AppError::new(ErrorCode::TokenUnknown),
            JwtError::Generation(msg) => AppError::internal(msg),
        }
    }
}

/// 生成可打印的安全 JWT 密钥 (用于开发环境)
pub fn generate_secure_printable_jwt_secret() -> String {
    const ALLOWED: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{}|;:,.<>?";

    let mut bytes = [0u8; 64];
    if SystemRandom::new().fill(&mut bytes).is_err() {
        // 随机数生成失败时使用固定的开发密钥
        return "DeliveryServerDevelopmentSecureKey2024!".to_string();
    }

    bytes
        .iter()
        .map(|b| ALLOWED[*b as usize % ALLOWED.len()] as char)
        .collect()
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("access_ttl_secs", &self.config.access_ttl_secs)
            .field("refresh_ttl_secs", &self.config.refresh_ttl_secs)
            .finish()
    }
}

impl JwtService {
    /// 使用指定配置创建新的 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            config,
        }
    }

    /// 为身份签发新的令牌对
    pub fn issue(&self, identity: &Identity) -> Result<TokenPair, JwtError> {
        self.issue_at(identity, shared::util::now_secs())
    }

    /// 以指定时间签发令牌对 (同一输入和时间产生相同令牌)
    pub fn issue_at(&self, identity: &Identity, now: i64) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.sign(identity, TokenKind::Access, now)?,
            refresh_token: self.sign(identity, TokenKind::Refresh, now)?,
        })
    }

    fn sign(&self, identity: &Identity, kind: TokenKind, now: i64) -> Result<String, JwtError> {
        let (key, ttl) = match kind {
            TokenKind::Access => (&self.access_encoding, self.config.access_ttl_secs),
            TokenKind::Refresh => (&self.refresh_encoding, self.config.refresh_ttl_secs),
        };
        let exp = now
            .checked_add(ttl)
            .ok_or_else(|| JwtError::Generation(format!("{} lifetime {ttl}s overflows", kind.as_str())))?;

        let claims = Claims {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role.as_str().to_string(),
            token_type: kind.as_str().to_string(),
            iat: now,
            exp,
            nbf: None,
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| JwtError::Generation(e.to_string()))
    }

    /// 验证令牌并还原身份
    ///
    /// 检查签名 (按令牌类型选择密钥)、`exp`、`nbf`、令牌类型以及四个身份字段。
    /// 不允许时钟偏差。
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Identity, JwtError> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        let claims = decode::<Claims>(token, key, &validation)
            .map_err(|e| map_decode_error(e.kind()))?
            .claims;

        if claims.token_type != kind.as_str() {
            return Err(JwtError::Malformed(format!(
                "expected {} token, got '{}'",
                kind.as_str(),
                claims.token_type
            )));
        }

        if claims.id.is_empty()
            || claims.email.is_empty()
            || claims.name.is_empty()
            || claims.role.is_empty()
        {
            return Err(JwtError::MissingClaims);
        }

        let role: Role = claims
            .role
            .parse()
            .map_err(|e: shared::models::UnknownRole| JwtError::Malformed(e.to_string()))?;

        Ok(Identity {
            id: claims.id,
            email: claims.email,
            name: claims.name,
            role,
        })
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

fn map_decode_error(kind: &ErrorKind) -> JwtError {
    match kind {
        ErrorKind::ExpiredSignature => JwtError::Expired,
        ErrorKind::ImmatureSignature => JwtError::NotYetValid,
        ErrorKind::MissingRequiredClaim(_) => JwtError::MissingClaims,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidIssuer
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_) => JwtError::Malformed(format!("{kind:?}")),
        other => JwtError::Unknown(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            access_secret: "access-secret-for-tests-0123456789abcdef".to_string(),
            refresh_secret: "refresh-secret-for-tests-0123456789abcdef".to_string(),
            access_ttl_secs: 60 * 15,
            refresh_ttl_secs: 60 * 60 * 24 * 7,
            issuer: "delivery-server".to_string(),
        })
    }

    fn ann() -> Identity {
        Identity {
            id: "u-1".to_string(),
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            role: Role::Customer,
        }
    }

    fn raw_token(secret: &str, claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_access_round_trip() {
        let service = test_service();
        let pair = service.issue(&ann()).unwrap();

        let identity = service.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(identity, ann());

        let identity = service.verify(&pair.refresh_token, TokenKind::Refresh).unwrap();
        assert_eq!(identity, ann());
    }

    #[test]
    fn test_issue_at_is_deterministic() {
        let service = test_service();
        let a = service.issue_at(&ann(), 1_700_000_000).unwrap();
        let b = service.issue_at(&ann(), 1_700_000_000).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.access_token, a.refresh_token);
    }

    #[test]
    fn test_expired_token() {
        let service = test_service();
        let long_ago = shared::util::now_secs() - 60 * 60 * 24 * 30;
        let pair = service.issue_at(&ann(), long_ago).unwrap();

        assert_eq!(
            service.verify(&pair.access_token, TokenKind::Access),
            Err(JwtError::Expired)
        );
        assert_eq!(
            service.verify(&pair.refresh_token, TokenKind::Refresh),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn test_overflowing_lifetime_fails_to_sign() {
        let mut config = test_service().config;
        config.access_ttl_secs = i64::MAX;
        let service = JwtService::with_config(config);

        assert!(matches!(
            service.issue(&ann()),
            Err(JwtError::Generation(_))
        ));
    }

    #[test]
    fn test_wrong_kind_is_malformed() {
        let service = test_service();
        let pair = service.issue(&ann()).unwrap();

        // 刷新令牌用访问密钥验证：签名不匹配
        assert!(matches!(
            service.verify(&pair.refresh_token, TokenKind::Access),
            Err(JwtError::Malformed(_))
        ));
    }

    #[test]
    fn test_token_type_checked_even_with_shared_secret() {
        let mut config = test_service().config;
        config.refresh_secret = config.access_secret.clone();
        let service = JwtService::with_config(config);
        let pair = service.issue(&ann()).unwrap();

        assert!(matches!(
            service.verify(&pair.refresh_token, TokenKind::Access),
            Err(JwtError::Malformed(_))
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = test_service();
        assert!(matches!(
            service.verify("not-a-token", TokenKind::Access),
            Err(JwtError::Malformed(_))
        ));
    }

    #[test]
    fn test_not_yet_valid() {
        let service = test_service();
        let now = shared::util::now_secs();
        let token = raw_token(
            &service.config.access_secret,
            &serde_json::json!({
                "id": "u-1", "email": "ann@example.com", "name": "Ann", "role": "Customer",
                "token_type": "access", "iat": now, "exp": now + 600, "nbf": now + 300,
                "iss": "delivery-server",
            }),
        );
        assert_eq!(
            service.verify(&token, TokenKind::Access),
            Err(JwtError::NotYetValid)
        );
    }

    #[test]
    fn test_missing_claims() {
        let service = test_service();
        let now = shared::util::now_secs();
        let token = raw_token(
            &service.config.access_secret,
            &serde_json::json!({
                "id": "u-1", "email": "ann@example.com",
                "token_type": "access", "iat": now, "exp": now + 600,
                "iss": "delivery-server",
            }),
        );
        assert_eq!(
            service.verify(&token, TokenKind::Access),
            Err(JwtError::MissingClaims)
        );
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        let service = test_service();
        let now = shared::util::now_secs();
        let token = raw_token(
            &service.config.access_secret,
            &serde_json::json!({
                "id": "u-1", "email": "ann@example.com", "name": "Ann", "role": "Admin",
                "token_type": "access", "iat": now, "exp": now + 600,
                "iss": "delivery-server",
            }),
        );
        assert!(matches!(
            service.verify(&token, TokenKind::Access),
            Err(JwtError::Malformed(_))
        ));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::from(JwtError::Expired).code, ErrorCode::TokenExpired);
        assert_eq!(
            AppError::from(JwtError::Malformed("x".into())).code,
            ErrorCode::TokenInvalid
        );
        assert_eq!(
            AppError::from(JwtError::NotYetValid).code,
            ErrorCode::TokenNotYetValid
        );
        assert_eq!(
            AppError::from(JwtError::MissingClaims).code,
            ErrorCode::TokenMissingClaims
        );
        assert_eq!(
            AppError::from(JwtError::Unknown("x".into())).code,
            ErrorCode::TokenUnknown
        );
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }

    #[test]
    fn test_secure_key_generation() {
        let a = generate_secure_printable_jwt_secret();
        let b = generate_secure_printable_jwt_secret();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.is_ascii());
    }
}
