//! # Key-Value Stores
//!
//! Backends for foodie-core's [`KeyValueStore`] port.
//!
//! ```text
//! ┌──────────────────────────┬─────────────────────────────────────────────┐
//! │ SqliteKeyValueStore      │ kv_store table, JSON text + updated_at      │
//! │ MemoryStore              │ HashMap behind a tokio RwLock               │
//! └──────────────────────────┴─────────────────────────────────────────────┘
//! ```
//!
//! Both store values as JSON. A row that no longer parses is reported as
//! [`DbError::CorruptValue`] so the storage service can fall back to the
//! default for that key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{DbError, DbResult};
use foodie_core::error::StorageResult;
use foodie_core::KeyValueStore;

// =============================================================================
// SQLite
// =============================================================================

/// Key-value store over the `kv_store` table.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Creates a new SqliteKeyValueStore.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteKeyValueStore { pool }
    }

    /// Reads and parses one value.
    pub async fn get_value(&self, key: &str) -> DbResult<Option<Value>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        raw.map(|text| {
            serde_json::from_str(&text).map_err(|e| DbError::CorruptValue {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    /// Inserts or replaces one value.
    pub async fn put_value(&self, key: &str, value: &Value) -> DbResult<()> {
        let text = serde_json::to_string(value)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, "Stored key");
        Ok(())
    }

    /// Deletes one key. Returns whether a row was removed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// When the key was last written.
    pub async fn updated_at(&self, key: &str) -> DbResult<Option<DateTime<Utc>>> {
        let updated: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT updated_at FROM kv_store WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(updated)
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.get_value(key).await?)
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        Ok(self.put_value(key, &value).await?)
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.delete(key).await?;
        Ok(())
    }
}

// =============================================================================
// Memory
// =============================================================================

/// In-process key-value store. Contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
