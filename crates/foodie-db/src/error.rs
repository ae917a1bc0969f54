//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageError (foodie-core) ← What the storage port reports            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageService logs it and falls back to a default                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use foodie_core::StorageError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Pool was closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored JSON could not be parsed.
    #[error("Corrupt value for key '{key}': {reason}")]
    CorruptValue { key: String, reason: String },

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(format!("JSON encoding failed: {}", err))
    }
}

/// Storage port view of a database failure.
impl From<DbError> for StorageError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(reason) | DbError::MigrationFailed(reason) => {
                StorageError::Unavailable(reason)
            }
            DbError::PoolExhausted => StorageError::Unavailable("connection pool exhausted".to_string()),
            DbError::CorruptValue { key, reason } => StorageError::Malformed { key, reason },
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_closed_maps_to_unavailable() {
        let db_err: DbError = sqlx::Error::PoolClosed.into();
        assert!(matches!(db_err, DbError::ConnectionFailed(_)));

        let storage_err: StorageError = db_err.into();
        assert!(matches!(storage_err, StorageError::Unavailable(_)));
    }

    #[test]
    fn test_corrupt_value_maps_to_malformed() {
        let storage_err: StorageError = DbError::CorruptValue {
            key: "fgf_theme_preference".to_string(),
            reason: "expected value".to_string(),
        }
        .into();
        assert!(matches!(storage_err, StorageError::Malformed { .. }));
    }
}
