//! 实时事件消息类型定义
//!
//! 这些类型在 delivery-server 和订阅客户端之间共享，用于
//! 进程内广播和 WebSocket 推送。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::Order;

/// 订阅主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    /// 新订单创建
    OrderCreated,
    /// 订单状态变更
    OrderUpdated,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::OrderCreated => "orderCreated",
            Topic::OrderUpdated => "orderUpdated",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orderCreated" => Ok(Topic::OrderCreated),
            "orderUpdated" => Ok(Topic::OrderUpdated),
            other => Err(format!("unknown topic: {other}")),
        }
    }
}

/// 广播给订阅者的订单事件（已提交的订单快照）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub topic: Topic,
    pub order: Order,
}

impl OrderEvent {
    pub fn new(topic: Topic, order: Order) -> Self {
        Self { topic, order }
    }
}
