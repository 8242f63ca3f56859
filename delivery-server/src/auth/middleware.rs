//! 认证中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::security_log;

/// WebSocket 订阅路由前缀 (浏览器无法设置请求头，令牌在处理器中从 `?token=` 读取)
const SUBSCRIPTION_PREFIX: &str = "/api/subscriptions/";

/// 认证中间件 - 要求有效访问令牌
///
/// 操作名取路径最后一段 (`/api/auth/login` → `login`)，交给
/// [`IdentityResolver`](crate::auth::IdentityResolver) 判断是否匿名放行。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/subscriptions/*` (在升级处理器中认证)
///
/// # 错误处理
///
/// | 错误 | 错误码 |
/// |------|--------|
/// | 无令牌 | 1001 NotAuthenticated |
/// | 令牌过期 | 1003 TokenExpired |
/// | 令牌无效 | 1004 TokenInvalid |
/// | 尚未生效 | 1008 TokenNotYetValid |
/// | 缺少声明 | 1009 TokenMissingClaims |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") || path.starts_with(SUBSCRIPTION_PREFIX) {
        return Ok(next.run(req).await);
    }

    let operation = operation_name(path);
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match state.resolver().resolve(operation, auth_header) {
        Ok(ctx) => {
            if let Some(identity) = ctx.identity {
                req.extensions_mut().insert(CurrentUser(identity));
            }
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.message.as_str(),
                code = e.code.code(),
                uri = format!("{:?}", req.uri())
            );
            Err(e)
        }
    }
}

/// 路径最后一个非空段
fn operation_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_name() {
        assert_eq!(operation_name("/api/auth/login"), "login");
        assert_eq!(operation_name("/api/auth/refreshToken/"), "refreshToken");
        assert_eq!(operation_name("/api/orders/abc-123/status"), "status");
        assert_eq!(operation_name("/"), "");
    }
}
