//! # Error Types
//!
//! Domain-specific error types for foodie-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  foodie-core errors (this file)                                        │
//! │  ├── CoreError        - Recipe collection misuse, bad recipe data      │
//! │  ├── StorageError     - Key-value collaborator failures                │
//! │  ├── AnalyticsError   - Analytics collaborator failures                │
//! │  └── DeliveryError    - Newsletter/contact delivery failures           │
//! │                                                                         │
//! │  foodie-db errors (separate crate)                                     │
//! │  └── DbError          - SQLite failures, converted to StorageError     │
//! │                                                                         │
//! │  NOT errors: field validation failures. Those are data in              │
//! │  `FormState::errors` and never travel through `Result`.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (key, id, etc.)
//! 3. Storage and analytics failures are swallowed by the services in
//!    [`crate::storage`] and [`crate::analytics`]; these types exist so
//!    backends can report what went wrong before it is logged.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core state logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The recipe collection was already loaded.
    ///
    /// ## When This Occurs
    /// - `RecipeCollection::load` called a second time. Loading is a
    ///   one-way `Uninitialized -> Loaded` transition.
    #[error("Recipe collection is already loaded ({count} recipes)")]
    AlreadyLoaded { count: usize },

    /// Recipe data failed a shape check while loading.
    #[error("Invalid recipe {id}: {reason}")]
    InvalidRecipe { id: String, reason: String },
}

// =============================================================================
// Storage Error
// =============================================================================

/// Errors raised by a [`crate::storage::KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend cannot be reached (closed pool, missing file, etc.).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded into the requested type.
    #[error("Stored value for '{key}' is malformed: {reason}")]
    Malformed { key: String, reason: String },

    /// Write was rejected by the backend.
    #[error("Failed to write '{key}': {reason}")]
    WriteFailed { key: String, reason: String },

    /// Any other backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Analytics Error
// =============================================================================

/// Errors raised by a [`crate::analytics::AnalyticsSink`].
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Sink refused the event (bad name, oversized params, ...).
    #[error("Event '{event}' rejected: {reason}")]
    Rejected { event: String, reason: String },

    /// Sink is not able to deliver events right now.
    #[error("Analytics sink unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Delivery Error
// =============================================================================

/// Errors raised when a submitted form cannot be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The receiving side answered and said no.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    /// The receiving side could not be reached.
    #[error("Delivery service unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for key-value backends.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::AlreadyLoaded { count: 12 };
        assert_eq!(
            err.to_string(),
            "Recipe collection is already loaded (12 recipes)"
        );

        let err = StorageError::Malformed {
            key: "fgf_favorites".to_string(),
            reason: "expected array".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Stored value for 'fgf_favorites' is malformed: expected array"
        );
    }

    #[test]
    fn test_invalid_recipe_message() {
        let err = CoreError::InvalidRecipe {
            id: "r9".to_string(),
            reason: "time must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid recipe r9: time must be positive");
    }
}
