//! OrdersManager - 订单状态机
//!
//! 订单状态唯一的写入方。每次变更：
//!
//! ```text
//! create / update_status
//!     ├─ 1. 角色守卫 (authorize)
//!     ├─ 2. 输入校验
//!     ├─ 3. 获取提交闸门
//!     ├─ 4. 开启写事务 (redb 单写者)
//!     ├─ 5. 读取当前记录 / 分配序号
//!     ├─ 6. 迁移检查，首个接单者写入 deliveryPartnerId
//!     ├─ 7. 持久化并提交
//!     ├─ 8. 广播已提交的订单
//!     └─ 9. 返回订单
//! ```
//!
//! 提交闸门跨越"写入 + 广播"，保证同一订单的事件按提交顺序发出。

mod error;
pub use error::*;

use parking_lot::Mutex;
use shared::message::Topic;
use shared::models::{CreateOrderInput, Identity, Order, OrderStatus, Role};

use super::policy::StatusPolicy;
use super::storage::{OrderRecord, OrderStorage};
use crate::auth::authorize;
use crate::message::EventBroadcaster;
use crate::utils::validation::{
    MAX_LOCATION_LEN, MAX_PRODUCT_LEN, validate_quantity, validate_required_text,
};

pub struct OrdersManager {
    storage: OrderStorage,
    broadcaster: EventBroadcaster,
    policy: StatusPolicy,
    commit_gate: Mutex<()>,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("broadcaster", &self.broadcaster)
            .field("policy", &self.policy)
            .finish()
    }
}

impl OrdersManager {
    pub fn new(storage: OrderStorage, broadcaster: EventBroadcaster, policy: StatusPolicy) -> Self {
        tracing::info!(policy = %policy, "OrdersManager started");
        Self {
            storage,
            broadcaster,
            policy,
            commit_gate: Mutex::new(()),
        }
    }

    /// Create an OrdersManager with the default policy and a private broadcaster
    pub fn with_storage(storage: OrderStorage) -> Self {
        Self::new(storage, EventBroadcaster::new(), StatusPolicy::default())
    }

    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }

    // ========== Mutations ==========

    /// 顾客下单，初始状态 `Pending`，无配送员
    pub fn create(&self, input: CreateOrderInput, actor: &Identity) -> ManagerResult<Order> {
        authorize(actor, Role::Customer)?;

        let product = input.product.trim();
        let location = input.location.trim();
        validate_required_text(product, "product", MAX_PRODUCT_LEN)?;
        validate_required_text(location, "location", MAX_LOCATION_LEN)?;
        validate_quantity(input.quantity)?;

        let now = shared::util::now_millis();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: actor.id.clone(),
            delivery_partner_id: None,
            product: product.to_string(),
            quantity: input.quantity,
            location: location.to_string(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let _gate = self.commit_gate.lock();
        let txn = self.storage.begin_write()?;
        let sequence = self.storage.increment_sequence(&txn)?;
        self.storage.insert_order(
            &txn,
            &OrderRecord {
                sequence,
                order: order.clone(),
            },
        )?;
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            sequence,
            "Order created"
        );
        self.broadcaster.publish(Topic::OrderCreated, &order);
        Ok(order)
    }

    /// 配送员推进订单状态
    ///
    /// 迁移到 `Accepted` 且尚无配送员时，写入当前操作者 (先到先得，
    /// 之后的接单不会改写)。
    pub fn update_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        actor: &Identity,
    ) -> ManagerResult<Order> {
        authorize(actor, Role::Delivery)?;

        let _gate = self.commit_gate.lock();
        let txn = self.storage.begin_write()?;
        let previous = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;

        let from = previous.order.status;
        if !self.policy.allows(from, new_status) {
            tracing::warn!(
                order_id,
                from = %from,
                to = %new_status,
                actor_id = %actor.id,
                "Rejected status transition"
            );
            return Err(ManagerError::InvalidTransition {
                from,
                to: new_status,
            });
        }

        let mut order = previous.order.clone();
        if new_status == OrderStatus::Accepted && order.delivery_partner_id.is_none() {
            order.delivery_partner_id = Some(actor.id.clone());
        }
        order.status = new_status;
        order.updated_at = shared::util::now_millis();

        self.storage.update_order(&txn, &previous, &order)?;
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            order_id,
            from = %from,
            to = %new_status,
            actor_id = %actor.id,
            "Order status updated"
        );
        self.broadcaster.publish(Topic::OrderUpdated, &order);
        Ok(order)
    }

    // ========== Queries ==========

    /// 任意已认证身份可查
    pub fn get_by_id(&self, order_id: &str) -> ManagerResult<Option<Order>> {
        Ok(self.storage.get_order(order_id)?)
    }

    /// 顾客自己的订单，新的在前
    pub fn customer_orders(&self, actor: &Identity) -> ManagerResult<Vec<Order>> {
        authorize(actor, Role::Customer)?;
        Ok(self.storage.orders_by_customer(&actor.id)?)
    }

    /// 分配给该配送员的订单，新的在前
    pub fn delivery_orders(&self, actor: &Identity) -> ManagerResult<Vec<Order>> {
        authorize(actor, Role::Delivery)?;
        Ok(self.storage.orders_by_partner(&actor.id)?)
    }

    /// 待接单的订单，新的在前
    pub fn pending_orders(&self, actor: &Identity) -> ManagerResult<Vec<Order>> {
        self.orders_by_status(OrderStatus::Pending, actor)
    }

    pub fn orders_by_status(
        &self,
        status: OrderStatus,
        actor: &Identity,
    ) -> ManagerResult<Vec<Order>> {
        authorize(actor, Role::Delivery)?;
        Ok(self.storage.orders_by_status(status)?)
    }
}

#[cfg(test)]
mod tests;
