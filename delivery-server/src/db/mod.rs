//! 数据库模块 - redb 嵌入式存储
//!
//! 用户凭证和订单共用一个 redb 文件 (`work_dir/delivery.redb`)。
//! redb 同一时刻只允许一个写事务，所有"检查后写入"都在单个写事务内完成。

pub mod users;

pub use users::{UserRecord, UserStorage};

use redb::Database;
use shared::error::AppError;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate key: {0}")]
    Duplicate(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(key) => AppError::already_exists(format!("{key} already exists")),
            other => AppError::database(other.to_string()),
        }
    }
}

/// Open or create the database file
///
/// redb commits with `Durability::Immediate` by default: once `commit()`
/// returns the data is on disk.
pub fn open_database(path: impl AsRef<Path>) -> StorageResult<Arc<Database>> {
    Ok(Arc::new(Database::create(path)?))
}

/// Open an in-memory database (tests and demos)
pub fn open_in_memory() -> StorageResult<Arc<Database>> {
    let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
    Ok(Arc::new(db))
}
