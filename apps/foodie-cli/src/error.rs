//! # CLI Error Type
//!
//! Unified error type for `foodie` commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command function  ── Result<(), CliError> ──►  main()                  │
//! │                                                  │                      │
//! │  ConfigError / DbError / CoreError / io::Error   ▼                      │
//! │  all convert with `?`                        eprintln + exit code 1    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use foodie_core::{CoreError, DeliveryError};
use foodie_db::DbError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Any failure a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("No recipe source configured. Pass --recipes or set [recipes] source")]
    NoRecipeSource,

    #[error("Failed to read recipes from {path}: {reason}")]
    RecipeSource { path: PathBuf, reason: String },

    #[error("Recipe not found: {0}")]
    UnknownRecipe(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Output failed: {0}")]
    Output(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub type CliResult<T> = Result<T, CliError>;
