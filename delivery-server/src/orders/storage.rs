//! redb-based storage layer for delivery orders
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `OrderRecord` (JSON) | Current order state |
//! | `order_sequence` | `"seq"` | `u64` | Global creation counter |
//! | `customer_orders` | `(customer_id, sequence)` | `order_id` | Customer listing |
//! | `partner_orders` | `(partner_id, sequence)` | `order_id` | Delivery partner listing |
//! | `status_orders` | `(status, sequence)` | `order_id` | Status listing |
//!
//! Index keys embed the creation sequence, so a reverse range scan yields
//! newest-first without sorting.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::{Deserialize, Serialize};
use shared::models::{Order, OrderStatus};
use std::sync::Arc;

use crate::db::{StorageError, StorageResult};

/// key = order_id, value = JSON-serialized OrderRecord
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("order_sequence");

const CUSTOMER_INDEX: TableDefinition<(&str, u64), &str> = TableDefinition::new("customer_orders");

const PARTNER_INDEX: TableDefinition<(&str, u64), &str> = TableDefinition::new("partner_orders");

const STATUS_INDEX: TableDefinition<(&str, u64), &str> = TableDefinition::new("status_orders");

const SEQUENCE_KEY: &str = "seq";

/// Stored order plus its creation sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub sequence: u64,
    pub order: Order,
}

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}

impl OrderStorage {
    /// Open or create the database at the given path
    #[cfg(test)]
    pub fn open(path: impl AsRef<std::path::Path>) -> StorageResult<Self> {
        Self::new(crate::db::open_database(path)?)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::new(crate::db::open_in_memory()?)
    }

    /// Wrap a shared database handle, creating the tables if missing
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(CUSTOMER_INDEX)?;
            let _ = write_txn.open_table(PARTNER_INDEX)?;
            let _ = write_txn.open_table(STATUS_INDEX)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a write transaction
    ///
    /// redb allows one writer at a time; a second caller blocks here until
    /// the first commits or aborts.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Increment and return the sequence number
    pub fn increment_sequence(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(SEQUENCE_KEY, next)?;
        Ok(next)
    }

    /// Get current sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    // ========== Order Operations ==========

    /// Store a brand-new order and its index entries
    pub fn insert_order(&self, txn: &WriteTransaction, record: &OrderRecord) -> StorageResult<()> {
        let order = &record.order;
        let value = serde_json::to_vec(record)?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            if table.get(order.id.as_str())?.is_some() {
                return Err(StorageError::Duplicate(order.id.clone()));
            }
            table.insert(order.id.as_str(), value.as_slice())?;
        }

        let seq = record.sequence;
        let mut customers = txn.open_table(CUSTOMER_INDEX)?;
        customers.insert((order.customer_id.as_str(), seq), order.id.as_str())?;

        let mut statuses = txn.open_table(STATUS_INDEX)?;
        statuses.insert((order.status.as_str(), seq), order.id.as_str())?;

        if let Some(partner) = &order.delivery_partner_id {
            let mut partners = txn.open_table(PARTNER_INDEX)?;
            partners.insert((partner.as_str(), seq), order.id.as_str())?;
        }
        Ok(())
    }

    /// Replace an order's state, keeping the indexes in step
    ///
    /// `previous` must be the record as read inside the same transaction.
    pub fn update_order(
        &self,
        txn: &WriteTransaction,
        previous: &OrderRecord,
        updated: &Order,
    ) -> StorageResult<()> {
        let seq = previous.sequence;
        let record = OrderRecord {
            sequence: seq,
            order: updated.clone(),
        };
        let value = serde_json::to_vec(&record)?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            table.insert(updated.id.as_str(), value.as_slice())?;
        }

        let before = &previous.order;
        if before.status != updated.status {
            let mut statuses = txn.open_table(STATUS_INDEX)?;
            statuses.remove((before.status.as_str(), seq))?;
            statuses.insert((updated.status.as_str(), seq), updated.id.as_str())?;
        }

        if before.delivery_partner_id != updated.delivery_partner_id {
            let mut partners = txn.open_table(PARTNER_INDEX)?;
            if let Some(old) = &before.delivery_partner_id {
                partners.remove((old.as_str(), seq))?;
            }
            if let Some(new) = &updated.delivery_partner_id {
                partners.insert((new.as_str(), seq), updated.id.as_str())?;
            }
        }
        Ok(())
    }

    /// Read an order record within a write transaction
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderRecord>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => {
                let record: OrderRecord = serde_json::from_slice(guard.value())?;
                Ok(Some(record.order))
            }
            None => Ok(None),
        }
    }

    // ========== Listings (newest first) ==========

    pub fn orders_by_customer(&self, customer_id: &str) -> StorageResult<Vec<Order>> {
        self.scan_index(CUSTOMER_INDEX, customer_id)
    }

    pub fn orders_by_partner(&self, partner_id: &str) -> StorageResult<Vec<Order>> {
        self.scan_index(PARTNER_INDEX, partner_id)
    }

    pub fn orders_by_status(&self, status: OrderStatus) -> StorageResult<Vec<Order>> {
        self.scan_index(STATUS_INDEX, status.as_str())
    }

    fn scan_index(
        &self,
        index: TableDefinition<(&str, u64), &str>,
        key: &str,
    ) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index_table = read_txn.open_table(index)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for entry in index_table.range((key, 0u64)..=(key, u64::MAX))?.rev() {
            let (_, order_id) = entry?;
            if let Some(guard) = orders_table.get(order_id.value())? {
                let record: OrderRecord = serde_json::from_slice(guard.value())?;
                orders.push(record.order);
            }
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, customer: &str) -> Order {
        Order {
            id: id.to_string(),
            customer_id: customer.to_string(),
            delivery_partner_id: None,
            product: "Pizza".to_string(),
            quantity: 1,
            location: "12 Main St".to_string(),
            status: OrderStatus::Pending,
            created_at: 1_000,
            updated_at: 1_000,
        }
    }

    fn insert(storage: &OrderStorage, order: Order) -> OrderRecord {
        let txn = storage.begin_write().unwrap();
        let sequence = storage.increment_sequence(&txn).unwrap();
        let record = OrderRecord { sequence, order };
        storage.insert_order(&txn, &record).unwrap();
        txn.commit().unwrap();
        record
    }

    #[test]
    fn test_insert_and_get() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let record = insert(&storage, order("o-1", "c-1"));

        assert_eq!(record.sequence, 1);
        assert_eq!(storage.get_order("o-1").unwrap(), Some(record.order));
        assert!(storage.get_order("missing").unwrap().is_none());
        assert_eq!(storage.get_current_sequence().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        insert(&storage, order("o-1", "c-1"));

        let txn = storage.begin_write().unwrap();
        let record = OrderRecord {
            sequence: storage.increment_sequence(&txn).unwrap(),
            order: order("o-1", "c-2"),
        };
        let err = storage.insert_order(&txn, &record).unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));
    }

    #[test]
    fn test_listings_newest_first() {
        let storage = OrderStorage::open_in_memory().unwrap();
        insert(&storage, order("o-1", "c-1"));
        insert(&storage, order("o-2", "c-2"));
        insert(&storage, order("o-3", "c-1"));

        let ids: Vec<_> = storage
            .orders_by_customer("c-1")
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, ["o-3", "o-1"]);

        let pending: Vec<_> = storage
            .orders_by_status(OrderStatus::Pending)
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(pending, ["o-3", "o-2", "o-1"]);

        assert!(storage.orders_by_customer("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_prefix_keys_do_not_bleed() {
        let storage = OrderStorage::open_in_memory().unwrap();
        insert(&storage, order("o-1", "c-1"));
        insert(&storage, order("o-2", "c-10"));

        let ids: Vec<_> = storage
            .orders_by_customer("c-1")
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, ["o-1"]);
    }

    #[test]
    fn test_update_moves_indexes() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let record = insert(&storage, order("o-1", "c-1"));

        let mut accepted = record.order.clone();
        accepted.status = OrderStatus::Accepted;
        accepted.delivery_partner_id = Some("d-1".to_string());
        accepted.updated_at = 2_000;

        let txn = storage.begin_write().unwrap();
        let previous = storage.get_order_txn(&txn, "o-1").unwrap().unwrap();
        storage.update_order(&txn, &previous, &accepted).unwrap();
        txn.commit().unwrap();

        assert!(storage.orders_by_status(OrderStatus::Pending).unwrap().is_empty());
        assert_eq!(
            storage.orders_by_status(OrderStatus::Accepted).unwrap(),
            vec![accepted.clone()]
        );
        assert_eq!(storage.orders_by_partner("d-1").unwrap(), vec![accepted.clone()]);
        assert_eq!(storage.orders_by_customer("c-1").unwrap(), vec![accepted]);
    }

    #[test]
    fn test_aborted_transaction_leaves_no_trace() {
        let storage = OrderStorage::open_in_memory().unwrap();
        {
            let txn = storage.begin_write().unwrap();
            let sequence = storage.increment_sequence(&txn).unwrap();
            storage
                .insert_order(&txn, &OrderRecord { sequence, order: order("o-1", "c-1") })
                .unwrap();
            // dropped without commit
        }

        assert!(storage.get_order("o-1").unwrap().is_none());
        assert_eq!(storage.get_current_sequence().unwrap(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.redb");
        {
            let storage = OrderStorage::open(&path).unwrap();
            insert(&storage, order("o-1", "c-1"));
        }
        let storage = OrderStorage::open(&path).unwrap();
        assert!(storage.get_order("o-1").unwrap().is_some());
        assert_eq!(storage.get_current_sequence().unwrap(), 1);
    }
}
