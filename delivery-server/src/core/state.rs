use std::sync::Arc;

use redb::Database;

use crate::auth::{AuthService, IdentityResolver, JwtService};
use crate::core::{Config, Result};
use crate::db::{self, UserStorage};
use crate::message::EventBroadcaster;
use crate::orders::{OrderStorage, OrdersManager};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，克隆进每个请求处理器。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | resolver | IdentityResolver | 请求头 → 身份 (持有 JwtService) |
/// | auth | AuthService | 注册、登录、刷新 |
/// | orders | Arc<OrdersManager> | 订单状态机 |
/// | broadcaster | EventBroadcaster | 订单事件广播 (与 OrdersManager 共享) |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub resolver: IdentityResolver,
    pub auth: AuthService,
    pub orders: Arc<OrdersManager>,
    pub broadcaster: EventBroadcaster,
}

impl ServerState {
    /// 打开工作目录下的数据库并组装所有服务
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let path = config.database_path();
        tracing::info!(path = %path.display(), "Opening database");
        let db = db::open_database(&path)?;
        Self::with_database(config, db)
    }

    /// 内存数据库 (测试和演示)
    pub fn in_memory(config: &Config) -> Result<Self> {
        Self::with_database(config, db::open_in_memory()?)
    }

    fn with_database(config: &Config, db: Arc<Database>) -> Result<Self> {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let resolver = IdentityResolver::new(jwt_service.clone());
        let auth = AuthService::new(UserStorage::new(db.clone())?, jwt_service.clone());

        let broadcaster = EventBroadcaster::new();
        let orders = Arc::new(OrdersManager::new(
            OrderStorage::new(db)?,
            broadcaster.clone(),
            config.status_policy,
        ));

        Ok(Self {
            config: config.clone(),
            resolver,
            auth,
            orders,
            broadcaster,
        })
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::Topic;

    #[test]
    fn test_broadcaster_is_shared_with_manager() {
        let state = ServerState::in_memory(&Config::for_tests()).unwrap();
        let _sub = state.broadcaster.subscribe(Topic::OrderCreated);
        assert_eq!(state.orders.broadcaster().subscriber_count(Topic::OrderCreated), 1);
    }

    #[test]
    fn test_initialize_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_tests();
        config.work_dir = dir.path().join("work").to_string_lossy().into_owned();

        let state = ServerState::initialize(&config).unwrap();
        assert!(config.database_path().exists());
        assert_eq!(state.auth.users().count().unwrap(), 0);
    }
}
