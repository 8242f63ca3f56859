//! redb-backed credential store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `users` | `user_id` | `UserRecord` (JSON) | Account records |
//! | `user_emails` | `email` (lower-case) | `user_id` | Uniqueness index |

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use shared::models::{Identity, PublicUser, Role};
use std::sync::Arc;

use super::{StorageError, StorageResult};

/// key = user_id, value = JSON-serialized UserRecord
const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// key = normalized email, value = user_id
const USER_EMAILS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Stored account (password hash never leaves the server)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: i64,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// 邮箱统一小写存储和查找
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct UserStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for UserStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStorage").finish_non_exhaustive()
    }
}

impl UserStorage {
    /// Wrap a shared database handle, creating the tables if missing
    pub fn new(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS_TABLE)?;
            let _ = write_txn.open_table(USER_EMAILS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::new(super::open_in_memory()?)
    }

    /// Insert a new account
    ///
    /// The email check and both inserts share one write transaction, so two
    /// concurrent signups with the same email cannot both succeed.
    pub fn insert(&self, record: &UserRecord) -> StorageResult<()> {
        let email = normalize_email(&record.email);
        let value = serde_json::to_vec(record)?;

        let txn = self.db.begin_write()?;
        {
            let mut emails = txn.open_table(USER_EMAILS_TABLE)?;
            if emails.get(email.as_str())?.is_some() {
                return Err(StorageError::Duplicate(email));
            }
            emails.insert(email.as_str(), record.id.as_str())?;

            let mut users = txn.open_table(USERS_TABLE)?;
            users.insert(record.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> StorageResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;
        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<UserRecord>> {
        let email = normalize_email(email);
        let read_txn = self.db.begin_read()?;

        let user_id = {
            let emails = read_txn.open_table(USER_EMAILS_TABLE)?;
            match emails.get(email.as_str())? {
                Some(guard) => guard.value().to_string(),
                None => return Ok(None),
            }
        };

        let users = read_txn.open_table(USERS_TABLE)?;
        match users.get(user_id.as_str())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn email_exists(&self, email: &str) -> StorageResult<bool> {
        let email = normalize_email(email);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USER_EMAILS_TABLE)?;
        Ok(table.get(email.as_str())?.is_some())
    }

    pub fn count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;
        Ok(table.len()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, email: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            email: email.to_string(),
            name: "Ann".to_string(),
            role: Role::Customer,
            password_hash: "$argon2id$stub".to_string(),
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let storage = UserStorage::open_in_memory().unwrap();
        let user = record("u-1", "ann@example.com");
        storage.insert(&user).unwrap();

        assert_eq!(storage.find_by_id("u-1").unwrap(), Some(user.clone()));
        assert_eq!(storage.find_by_email("ann@example.com").unwrap(), Some(user));
        assert!(storage.find_by_id("missing").unwrap().is_none());
        assert!(storage.find_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_email_lookup_is_case_insensitive() {
        let storage = UserStorage::open_in_memory().unwrap();
        storage.insert(&record("u-1", "Ann@Example.com")).unwrap();

        assert!(storage.email_exists("ann@example.com").unwrap());
        assert!(storage.find_by_email("  ANN@EXAMPLE.COM ").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let storage = UserStorage::open_in_memory().unwrap();
        storage.insert(&record("u-1", "ann@example.com")).unwrap();

        let err = storage.insert(&record("u-2", "ANN@example.com")).unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(ref e) if e == "ann@example.com"));
        assert_eq!(storage.count().unwrap(), 1);
        assert!(storage.find_by_id("u-2").unwrap().is_none());
    }

    #[test]
    fn test_concurrent_signup_same_email() {
        let storage = UserStorage::open_in_memory().unwrap();

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let storage = storage.clone();
                    s.spawn(move || storage.insert(&record(&format!("u-{i}"), "race@example.com")))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_public_view_drops_hash() {
        let user = record("u-1", "ann@example.com");
        let json = serde_json::to_value(user.public()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["createdAt"], 1_700_000_000_000i64);
        assert_eq!(user.identity().role, Role::Customer);
    }
}
