//! CurrentUser 提取器

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::security_log;

/// 处理器中直接声明 `user: CurrentUser` 即可获得已认证身份
///
/// 中间件已注入时复用扩展中的值；否则自行解析 Authorization 头。
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match crate::auth::context::bearer_token(auth_header) {
            Some(token) => token,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::not_authenticated());
            }
        };

        let ctx = state.resolver().resolve_token(token).inspect_err(|e| {
            security_log!(
                "WARN",
                "auth_failed",
                error = e.message.as_str(),
                uri = format!("{:?}", parts.uri)
            );
        })?;
        let identity = ctx.require_identity()?.clone();
        let user = CurrentUser(identity);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
