//! Key-value storage backends for durable client state

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::DbPool;
use crate::{Error, Result};

/// Durable string storage keyed by a fixed identifier
///
/// Mirrors the browser's local storage: one string value per key,
/// overwritten on every write.
pub trait StateStorage: Send + Sync {
    /// Read the value stored under `key`, if any
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// `SQLite`-backed key-value store
#[derive(Clone)]
pub struct KvStore {
    db: DbPool,
}

impl KvStore {
    /// Create a new store backed by the given pool
    #[must_use]
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl StateStorage for KvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.db.get().map_err(|e| Error::Database(e.to_string()))?;
        let result = conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.get().map_err(|e| Error::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

/// In-memory storage, shared between clones
#[derive(Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-seeded with one value
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut values) = storage.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        storage
    }
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| Error::Database(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
