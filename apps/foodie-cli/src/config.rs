//! # CLI Configuration
//!
//! Configuration for the `foodie` binary.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FOODIE_DB_PATH=/tmp/foodie.db                                      │
//! │     FOODIE_ANALYTICS_ENABLED=true                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/foodie/config.toml (Linux)                               │
//! │     ~/Library/Application Support/com.foodie.foodie/config.toml        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     data-dir database, analytics off, sort by name                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! database_path = "/home/ana/.local/share/foodie/foodie.db"
//! in_memory = false
//!
//! [analytics]
//! enabled = true
//! measurement_id = "G-ABC123"
//!
//! [recipes]
//! source = "data/recipes.json"
//! default_sort = "rating"
//! ```

use directories::ProjectDirs;
use foodie_core::SortKey;
use foodie_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "foodie.db";

// =============================================================================
// Sections
// =============================================================================

/// Where persistent state lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file. Default: `foodie.db` in the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Keep everything in memory for this run only.
    #[serde(default)]
    pub in_memory: bool,
}

/// Analytics behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    /// Forward events to the sink. When off, events are only debug-logged.
    #[serde(default)]
    pub enabled: bool,

    /// Measurement id attached to forwarded events.
    #[serde(default)]
    pub measurement_id: Option<String>,
}

/// Recipe data source and default view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeSettings {
    /// JSON file holding an array of recipes.
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// Sort key used when `--sort` is not given.
    #[serde(default)]
    pub default_sort: SortKey,
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub analytics: AnalyticsSettings,

    #[serde(default)]
    pub recipes: RecipeSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, else the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Loads configuration for one run of the binary.
    ///
    /// A file named with `--config` must load cleanly. The platform default
    /// location is optional, so a broken one is logged and defaults are used.
    pub fn for_run(explicit: Option<PathBuf>) -> ConfigResult<Self> {
        match explicit {
            Some(path) => Self::load(Some(path)),
            None => Ok(Self::load_or_default(None)),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(path) = &self.storage.database_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "storage.database_path must not be empty".into(),
                ));
            }
        }

        if let Some(id) = &self.analytics.measurement_id {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "analytics.measurement_id must not be blank".into(),
                ));
            }
        }

        if let Some(source) = &self.recipes.source {
            if source.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("recipes.source must not be empty".into()));
            }
        }

        Ok(())
    }

    /// Applies `FOODIE_*` overrides. Unparsable values are logged and ignored.
    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("FOODIE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(flag) = var("FOODIE_IN_MEMORY") {
            match parse_bool(&flag) {
                Some(in_memory) => self.storage.in_memory = in_memory,
                None => warn!(value = %flag, "Ignoring FOODIE_IN_MEMORY"),
            }
        }

        if let Some(flag) = var("FOODIE_ANALYTICS_ENABLED") {
            match parse_bool(&flag) {
                Some(enabled) => self.analytics.enabled = enabled,
                None => warn!(value = %flag, "Ignoring FOODIE_ANALYTICS_ENABLED"),
            }
        }

        if let Some(id) = var("FOODIE_MEASUREMENT_ID") {
            self.analytics.measurement_id = Some(id);
        }

        if let Some(path) = var("FOODIE_RECIPES_PATH") {
            debug!(path = %path, "Overriding recipe source from environment");
            self.recipes.source = Some(PathBuf::from(path));
        }

        if let Some(sort) = var("FOODIE_DEFAULT_SORT") {
            match sort.parse() {
                Ok(key) => self.recipes.default_sort = key,
                Err(e) => warn!(error = %e, "Ignoring FOODIE_DEFAULT_SORT"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Database settings derived from `[storage]`.
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        if self.storage.in_memory {
            return Ok(DbConfig::in_memory());
        }

        let path = match &self.storage.database_path {
            Some(path) => path.clone(),
            None => project_dirs()
                .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
                .ok_or_else(|| {
                    ConfigError::Invalid(
                        "Could not determine data directory; set storage.database_path".into(),
                    )
                })?,
        };

        Ok(DbConfig::new(path))
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolves the recipe source, preferring an explicit path.
    pub fn recipe_source<'a>(&'a self, explicit: Option<&'a Path>) -> Option<&'a Path> {
        explicit.or(self.recipes.source.as_deref())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "foodie", "foodie")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.analytics.enabled);
        assert!(!config.storage.in_memory);
        assert_eq!(config.recipes.default_sort, SortKey::Name);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[storage]
database_path = "/tmp/foodie-test.db"

[analytics]
enabled = true
measurement_id = "G-TEST"

[recipes]
source = "recipes.json"
default_sort = "rating"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(
            config.storage.database_path,
            Some(PathBuf::from("/tmp/foodie-test.db"))
        );
        assert!(config.analytics.enabled);
        assert_eq!(config.analytics.measurement_id.as_deref(), Some("G-TEST"));
        assert_eq!(config.recipes.default_sort, SortKey::Rating);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analytics]\nenabled = true").unwrap();

        let config = AppConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert!(config.analytics.enabled);
        assert_eq!(config.recipes, RecipeSettings::default());
    }

    #[test]
    fn test_bad_file_fails_load_but_not_load_or_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[recipes]\ndefault_sort = \"price\"").unwrap();

        assert!(AppConfig::load(Some(file.path().to_path_buf())).is_err());
        let config = AppConfig::load_or_default(Some(file.path().to_path_buf()));
        assert_eq!(config.recipes.default_sort, SortKey::Name);
    }

    #[test]
    fn test_for_run_rejects_broken_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage\nin_memory = true").unwrap();

        let err = AppConfig::for_run(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_for_run_with_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nin_memory = true").unwrap();

        let config = AppConfig::for_run(Some(file.path().to_path_buf())).unwrap();
        assert!(config.storage.in_memory);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[
            ("FOODIE_DB_PATH", "/srv/foodie.db"),
            ("FOODIE_ANALYTICS_ENABLED", "yes"),
            ("FOODIE_DEFAULT_SORT", "time"),
            ("FOODIE_IN_MEMORY", "maybe"),
        ]));

        assert_eq!(config.storage.database_path, Some(PathBuf::from("/srv/foodie.db")));
        assert!(config.analytics.enabled);
        assert_eq!(config.recipes.default_sort, SortKey::Time);
        assert!(!config.storage.in_memory);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.analytics.measurement_id = Some("  ".to_string());
        assert!(config.validate().is_err());

        config.analytics.measurement_id = None;
        config.storage.database_path = Some(PathBuf::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_db_config() {
        let mut config = AppConfig::default();
        config.storage.in_memory = true;
        assert_eq!(
            config.db_config().unwrap().database_path,
            PathBuf::from(":memory:")
        );

        config.storage.in_memory = false;
        config.storage.database_path = Some(PathBuf::from("/tmp/x.db"));
        assert_eq!(config.db_config().unwrap().database_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.recipes.default_sort = SortKey::Difficulty;
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[recipes]"));

        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_recipe_source_prefers_explicit() {
        let mut config = AppConfig::default();
        config.recipes.source = Some(PathBuf::from("configured.json"));
        let explicit = PathBuf::from("explicit.json");

        assert_eq!(config.recipe_source(Some(explicit.as_path())), Some(explicit.as_path()));
        assert_eq!(
            config.recipe_source(None),
            Some(Path::new("configured.json"))
        );
    }
}
