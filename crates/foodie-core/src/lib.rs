//! # foodie-core: Pure State Logic for Foodie
//!
//! This crate holds the state machinery behind the Foodie recipe site:
//! rule-driven form validation and the recipe collection with its
//! filter/search/sort pipeline and favorites.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Foodie Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Front end (web UI or foodie-cli)                   │   │
//! │  │   Inputs ──► Category buttons ──► Search box ──► Recipe cards   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ change / blur / submit / click         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ foodie-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐  ┌───────────┐  ┌────────────┐  ┌──────────┐  │   │
//! │  │   │ validation │  │   form    │  │  recipes   │  │  ports   │  │   │
//! │  │   │ FieldRule  │  │ Validator │  │ Collection │  │ storage  │  │   │
//! │  │   │ RuleSet    │  │ FormState │  │ SortKey    │  │ analytics│  │   │
//! │  │   └────────────┘  └───────────┘  └────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • COLLABORATORS ARE TRAITS                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              foodie-db (SQLite key-value store)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Recipe, difficulty, sort key, newsletter status
//! - [`validation`] - Field rules and the single-field validator
//! - [`form`] - Form state, change/blur/submit handling
//! - [`forms`] - Newsletter and contact form flows
//! - [`recipes`] - Recipe collection with favorites
//! - [`storage`] - Key-value persistence port and service
//! - [`analytics`] - Analytics port and service
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use foodie_core::form::FormValidator;
//! use foodie_core::validation::{FieldRule, RuleSet};
//!
//! let mut form = FormValidator::new([("email", "")]);
//! let rules = RuleSet::new().field("email", FieldRule::new().required().email());
//!
//! assert!(!form.validate_form(Some(rules)));
//! assert_eq!(form.state().errors["email"], "This field is required");
//!
//! form.set_value("email", "cook@example.com");
//! assert!(form.validate_form(None));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod error;
pub mod form;
pub mod forms;
pub mod recipes;
pub mod storage;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use analytics::{AnalyticsService, AnalyticsSink, EventParams};
pub use error::{AnalyticsError, CoreError, DeliveryError, StorageError};
pub use form::{FormOptions, FormState, FormValidator, SharedForm, SubmitOutcome};
pub use forms::{ContactRequest, NewsletterSignup};
pub use recipes::{FavoriteToggle, RecipeCollection};
pub use storage::{KeyValueStore, StorageService};
pub use types::*;
pub use validation::{FieldRule, FieldValue, FormValues, RuleSet, Verdict};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Category filter value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// Storage keys shared with the web front end.
///
/// The `fgf_` prefix matches what the browser build writes to localStorage,
/// so exported data can be moved between the two.
pub mod keys {
    /// List of favorited recipe ids.
    pub const FAVORITES: &str = "fgf_favorites";
    /// Newsletter subscription status.
    pub const NEWSLETTER: &str = "fgf_newsletter_status";
    /// Light/dark theme preference.
    pub const THEME: &str = "fgf_theme_preference";
    /// Free-form user preference object.
    pub const USER_PREFERENCES: &str = "fgf_user_preferences";
}
