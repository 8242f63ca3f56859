//! HTTP API 路由
//!
//! | 模块 | 前缀 | 说明 |
//! |------|------|------|
//! | health | /health | 存活检查 |
//! | auth | /api/auth | 注册、登录、刷新、当前用户 |
//! | orders | /api/orders | 下单、状态推进、查询 |
//! | subscriptions | /api/subscriptions | WebSocket 事件订阅 |

pub mod auth;
pub mod extract;
pub mod health;
pub mod orders;
pub mod subscriptions;

pub use extract::ValidJson;

use shared::error::{AppError, AppResult};

/// 在阻塞线程池中执行存储或哈希操作 (redb 写事务、argon2)
pub(crate) async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("spawn_blocking join error: {e}");
        AppError::internal(format!("Task failed: {e}"))
    })?
}
