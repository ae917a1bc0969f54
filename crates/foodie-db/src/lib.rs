//! # foodie-db: Persistence Layer for Foodie
//!
//! SQLite-backed implementation of foodie-core's key-value storage port,
//! plus an in-memory store for tests and throwaway sessions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Foodie Data Flow                                 │
//! │                                                                         │
//! │  RecipeCollection::toggle_favorite / NewsletterSignup::submit          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageService (foodie-core)                                          │
//! │       │  dyn KeyValueStore                                              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    foodie-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │ SqliteKeyValueStore │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ MemoryStore         │  │ (embedded) │  │   │
//! │  │   └───────────────┘    └─────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/foodie/foodie.db                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use foodie_core::StorageService;
//! use foodie_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("foodie.db")).await?;
//! let storage = StorageService::new(Arc::new(db.kv_store()));
//! let favorites = storage.favorites().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{MemoryStore, SqliteKeyValueStore};
