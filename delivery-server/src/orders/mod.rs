//! 订单模块
//!
//! - **storage**: redb 持久化 (订单、创建序号、列表索引)
//! - **policy**: 状态迁移规则
//! - **manager**: OrdersManager，唯一的订单写入方
//!
//! ```text
//! Request → authorize(role) → OrdersManager ──写事务──→ OrderStorage (redb)
//!                                   │ 提交后
//!                                   ▼
//!                            EventBroadcaster → Subscribers
//! ```

pub mod manager;
pub mod policy;
pub mod storage;

pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use policy::StatusPolicy;
pub use storage::{OrderRecord, OrderStorage};
