//! # Key-Value Persistence
//!
//! The port through which foodie-core persists small pieces of user state,
//! and the service that wraps it.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   RecipeCollection / NewsletterSignup                                   │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   StorageService          typed get/set, failures logged + swallowed    │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   dyn KeyValueStore       raw JSON values, failures returned            │
//! │          │                                                              │
//! │          ├──► SqliteKeyValueStore   (foodie-db)                         │
//! │          └──► MemoryStore           (foodie-db, tests)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage is best effort. A read that fails or returns undecodable data
//! yields the caller's default; a write that fails returns `false`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StorageResult;
use crate::keys;
use crate::types::{NewsletterStatus, Theme};

// =============================================================================
// Port
// =============================================================================

/// A string-keyed store of JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Stores a value, replacing any previous one.
    async fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Deletes a key. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

// =============================================================================
// Service
// =============================================================================

/// Typed, failure-tolerant wrapper around a [`KeyValueStore`].
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService").finish_non_exhaustive()
    }
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        StorageService { store }
    }

    /// Reads and decodes `key`, returning `default` on absence or failure.
    pub async fn get_or<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        match self.store.get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored value is malformed, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!(key = %key, error = %e, "Storage read failed, using default");
                default
            }
        }
    }

    /// Encodes and writes `value`. Returns false if it could not be stored.
    pub async fn set<T>(&self, key: &str, value: &T) -> bool
    where
        T: Serialize + ?Sized,
    {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Value could not be encoded, not stored");
                return false;
            }
        };

        match self.store.set(key, value).await {
            Ok(()) => {
                debug!(key = %key, "Stored value");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Storage write failed");
                false
            }
        }
    }

    /// Deletes `key`. Returns false if the backend refused.
    pub async fn remove(&self, key: &str) -> bool {
        match self.store.remove(key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Storage remove failed");
                false
            }
        }
    }

    // =========================================================================
    // App Keys
    // =========================================================================

    pub async fn favorites(&self) -> Vec<String> {
        self.get_or(keys::FAVORITES, Vec::new()).await
    }

    pub async fn set_favorites(&self, ids: &[String]) -> bool {
        self.set(keys::FAVORITES, ids).await
    }

    pub async fn newsletter_status(&self) -> NewsletterStatus {
        self.get_or(keys::NEWSLETTER, NewsletterStatus::default()).await
    }

    pub async fn set_newsletter_status(&self, status: NewsletterStatus) -> bool {
        self.set(keys::NEWSLETTER, &status).await
    }

    pub async fn theme(&self) -> Theme {
        self.get_or(keys::THEME, Theme::default()).await
    }

    pub async fn set_theme(&self, theme: Theme) -> bool {
        self.set(keys::THEME, &theme).await
    }

    /// Free-form preferences object. Non-object values read as empty.
    pub async fn user_preferences(&self) -> serde_json::Map<String, Value> {
        self.get_or(keys::USER_PREFERENCES, serde_json::Map::new())
            .await
    }

    pub async fn set_user_preferences(&self, prefs: &serde_json::Map<String, Value>) -> bool {
        self.set(keys::USER_PREFERENCES, prefs).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        data: Mutex<HashMap<String, Value>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
            self.data.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> StorageResult<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> StorageResult<Option<Value>> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }

        async fn set(&self, key: &str, _value: Value) -> StorageResult<()> {
            Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            })
        }

        async fn remove(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
    }

    #[tokio::test]
    async fn test_favorites_round_trip() {
        let storage = StorageService::new(Arc::new(MapStore::default()));
        assert!(storage.favorites().await.is_empty());

        let ids = vec!["r1".to_string(), "r3".to_string()];
        assert!(storage.set_favorites(&ids).await);
        assert_eq!(storage.favorites().await, ids);
    }

    #[tokio::test]
    async fn test_newsletter_status_uses_wire_strings() {
        let store = Arc::new(MapStore::default());
        let storage = StorageService::new(store.clone());
        assert_eq!(storage.newsletter_status().await, NewsletterStatus::NotSubscribed);

        storage.set_newsletter_status(NewsletterStatus::Subscribed).await;
        assert_eq!(
            store.data.lock().unwrap()[keys::NEWSLETTER],
            Value::String("subscribed".to_string())
        );
    }

    #[tokio::test]
    async fn test_malformed_value_reads_as_default() {
        let store = Arc::new(MapStore::default());
        store
            .data
            .lock()
            .unwrap()
            .insert(keys::FAVORITES.to_string(), Value::from(42));

        let storage = StorageService::new(store);
        assert!(storage.favorites().await.is_empty());
    }

    #[tokio::test]
    async fn test_broken_store_is_swallowed() {
        let storage = StorageService::new(Arc::new(BrokenStore));
        assert!(storage.favorites().await.is_empty());
        assert_eq!(storage.theme().await, Theme::System);
        assert!(!storage.set_theme(Theme::Dark).await);
        assert!(!storage.remove(keys::THEME).await);
    }

    #[tokio::test]
    async fn test_user_preferences_object() {
        let storage = StorageService::new(Arc::new(MapStore::default()));
        let mut prefs = serde_json::Map::new();
        prefs.insert("units".to_string(), Value::from("metric"));

        assert!(storage.set_user_preferences(&prefs).await);
        assert_eq!(storage.user_preferences().await, prefs);
        assert!(storage.remove(keys::USER_PREFERENCES).await);
        assert!(storage.user_preferences().await.is_empty());
    }
}
