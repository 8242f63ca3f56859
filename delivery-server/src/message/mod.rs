//! 订单事件广播
//!
//! ```text
//! OrdersManager (提交后)
//!       │ publish(topic, order)
//!       ▼
//! EventBroadcaster
//!   └── topics: topic → [订阅者发送端]
//!         │
//!         ▼
//!   Subscription (WebSocket 会话 / 测试)
//! ```

pub mod bus;

pub use bus::{EventBroadcaster, Subscription};
pub use shared::message::{OrderEvent, Topic};
