//! 认证授权模块
//!
//! - [`JwtService`] - 访问/刷新令牌的签发与验证
//! - [`IdentityResolver`] - 把请求头解析为身份
//! - [`authorize`] - 角色守卫
//! - [`AuthService`] - 注册、登录、刷新
//! - [`require_auth`] - 认证中间件

pub mod context;
pub mod extractor;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use context::{CurrentUser, IdentityResolver, RequestContext, is_anonymous_operation};
pub use guard::authorize;
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenKind};
pub use middleware::require_auth;
pub use service::AuthService;
