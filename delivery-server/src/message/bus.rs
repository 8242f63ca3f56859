//! EventBroadcaster - 按主题分发已提交的订单
//!
//! 每个订阅者持有独立的无界队列：发布不阻塞，慢订阅者不丢事件，
//! 同一订阅者按发布顺序收到事件。订阅者丢弃 [`Subscription`] 后，
//! 下一次发布时其发送端被清理。

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use shared::message::{OrderEvent, Topic};
use shared::models::Order;
use tokio::sync::mpsc;

/// 进程内订单事件广播器
#[derive(Clone, Default)]
pub struct EventBroadcaster {
    /// topic → 订阅者发送端
    topics: Arc<DashMap<Topic, Vec<mpsc::UnboundedSender<OrderEvent>>>>,
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("topics", &self.topics.len())
            .finish()
    }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅一个主题，只会收到订阅之后发布的事件
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics.entry(topic).or_default().push(tx);
        tracing::debug!(topic = %topic, "Subscriber attached");
        Subscription { topic, rx }
    }

    /// 向主题的所有订阅者推送订单快照，返回送达的订阅者数量
    ///
    /// 无订阅者时返回 0。
    pub fn publish(&self, topic: Topic, order: &Order) -> usize {
        let Some(mut senders) = self.topics.get_mut(&topic) else {
            return 0;
        };

        let event = OrderEvent::new(topic, order.clone());
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        let delivered = senders.len();
        tracing::debug!(topic = %topic, order_id = %order.id, delivered, "Event published");
        delivered
    }

    /// 当前仍存活的订阅者数量
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics
            .get(&topic)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

/// 单个主题的订阅，丢弃即取消订阅
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    rx: mpsc::UnboundedReceiver<OrderEvent>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// 等待下一个事件；广播器被丢弃后返回 `None`
    pub async fn recv(&mut self) -> Option<OrderEvent> {
        self.rx.recv().await
    }

    /// 非阻塞读取
    pub fn try_recv(&mut self) -> Option<OrderEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = OrderEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
