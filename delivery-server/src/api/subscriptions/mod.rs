//! Subscription Routes
//!
//! GET /api/subscriptions/{topic}?token=<JWT>
//!
//! 令牌可放在 `Authorization` 头或 `token` 查询参数 (浏览器 WebSocket 无法设置请求头)。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/subscriptions/{topic}", get(handler::subscribe))
}
