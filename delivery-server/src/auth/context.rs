//! 请求上下文
//!
//! 把 `Authorization` 头解析为已验证身份。匿名操作 (登录、注册、刷新)
//! 直接放行，不读取请求头。

use std::sync::Arc;

use shared::error::AppError;
use shared::models::Identity;

use super::jwt::{JwtService, TokenKind};

/// 无需令牌即可调用的操作 (大小写不敏感)
pub const ANONYMOUS_OPERATIONS: [&str; 4] = ["login", "signup", "refresh", "refreshtoken"];

/// 操作是否属于匿名白名单
pub fn is_anonymous_operation(operation: &str) -> bool {
    ANONYMOUS_OPERATIONS
        .iter()
        .any(|op| op.eq_ignore_ascii_case(operation))
}

/// 单个请求的身份上下文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// 取出身份，未认证时返回 `NotAuthenticated`
    pub fn require_identity(&self) -> Result<&Identity, AppError> {
        self.identity.as_ref().ok_or_else(AppError::not_authenticated)
    }
}

/// 已认证用户
///
/// 由 [`require_auth`](super::require_auth) 注入请求扩展，处理器通过提取器获取。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Identity);

impl CurrentUser {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

impl From<Identity> for CurrentUser {
    fn from(identity: Identity) -> Self {
        Self(identity)
    }
}

/// 身份解析器
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    jwt: Arc<JwtService>,
}

impl IdentityResolver {
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self { jwt }
    }

    /// 为操作解析请求上下文
    ///
    /// - 匿名操作：返回匿名上下文
    /// - 缺少令牌或令牌为空：`NotAuthenticated`
    /// - 令牌验证失败：原样传递对应的令牌错误码，不重试
    pub fn resolve(
        &self,
        operation: &str,
        authorization: Option<&str>,
    ) -> Result<RequestContext, AppError> {
        if is_anonymous_operation(operation) {
            return Ok(RequestContext::anonymous());
        }

        let token = bearer_token(authorization).ok_or_else(AppError::not_authenticated)?;
        self.resolve_token(token)
    }

    /// 直接验证一个访问令牌 (WebSocket `?token=` 场景)
    pub fn resolve_token(&self, token: &str) -> Result<RequestContext, AppError> {
        let identity = self.jwt.verify(token, TokenKind::Access)?;
        Ok(RequestContext::authenticated(identity))
    }
}

/// 从 Authorization 头提取非空 Bearer 令牌
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    authorization
        .and_then(JwtService::extract_from_header)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
