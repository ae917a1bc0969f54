//! # Application Context
//!
//! Everything a command needs, wired once per run.
//!
//! ```text
//! AppConfig ──► DbConfig ──► Database ──► SqliteKeyValueStore ──► StorageService
//!          └──► [analytics] ──────────────► TracingAnalytics ───► AnalyticsService
//!          └──► [recipes] source ─────────► Vec<Recipe> ────────► RecipeCollection
//! ```

use async_trait::async_trait;
use foodie_core::analytics::TracingAnalytics;
use foodie_core::forms::NewsletterSubscriber;
use foodie_core::{AnalyticsService, DeliveryError, Recipe, RecipeCollection, StorageService};
use foodie_db::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Services shared by all commands.
pub struct AppContext {
    pub config: AppConfig,
    pub db: Database,
    pub storage: StorageService,
    pub analytics: AnalyticsService,
    recipe_source: Option<PathBuf>,
}

impl AppContext {
    /// Opens the store and builds the services described by `config`.
    pub async fn open(config: AppConfig, recipe_source: Option<PathBuf>) -> CliResult<Self> {
        let db = Database::new(config.db_config()?).await?;
        let storage = StorageService::new(Arc::new(db.kv_store()));

        let sink = TracingAnalytics::new(config.analytics.measurement_id.clone());
        let analytics = AnalyticsService::new(Arc::new(sink)).with_enabled(config.analytics.enabled);
        debug!(
            session_id = %analytics.session_id(),
            enabled = analytics.is_enabled(),
            "Analytics session started"
        );

        let recipe_source = config
            .recipe_source(recipe_source.as_deref())
            .map(Path::to_path_buf);

        Ok(AppContext {
            config,
            db,
            storage,
            analytics,
            recipe_source,
        })
    }

    /// Loads the configured recipe file into a fresh collection with the
    /// persisted favorites.
    pub async fn collection(&self) -> CliResult<RecipeCollection> {
        let path = self.recipe_source.as_deref().ok_or(CliError::NoRecipeSource)?;
        let recipes = read_recipes(path)?;

        let mut collection = RecipeCollection::new(self.storage.clone(), self.analytics.clone())
            .with_sort_key(self.config.recipes.default_sort);
        collection.load_favorites().await;
        collection.load(recipes)?;
        Ok(collection)
    }

    /// Flushes and closes the store.
    pub async fn close(self) {
        debug!(
            session_secs = self.analytics.session_duration().num_seconds(),
            "Closing session"
        );
        self.db.close().await;
    }
}

/// Reads a JSON array of recipes.
pub fn read_recipes(path: &Path) -> CliResult<Vec<Recipe>> {
    let source_error = |reason: String| CliError::RecipeSource {
        path: path.to_path_buf(),
        reason,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| source_error(e.to_string()))?;
    let recipes: Vec<Recipe> =
        serde_json::from_str(&contents).map_err(|e| source_error(e.to_string()))?;

    info!(path = %path.display(), count = recipes.len(), "Read recipe file");
    Ok(recipes)
}

/// Newsletter subscriber for the CLI. There is no mailing-list service to
/// call, so the subscription is recorded in the log and always succeeds.
#[derive(Debug, Default)]
pub struct LoggedSubscriber;

#[async_trait]
impl NewsletterSubscriber for LoggedSubscriber {
    async fn subscribe(&self, email: &str) -> Result<(), DeliveryError> {
        info!(email = %email, "Newsletter subscription recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn recipe_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
  {{"id": "r1", "title": "Apple Pie", "category": "dessert", "difficulty": "easy",
    "time": 60, "servings": 8, "rating": 4.8, "description": "Flaky crust"}},
  {{"id": "r2", "title": "Beef Stew", "category": "main", "difficulty": "medium",
    "time": 120, "servings": 4, "rating": 4.5}}
]"#
        )
        .unwrap();
        file
    }

    fn in_memory() -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.in_memory = true;
        config
    }

    #[test]
    fn test_read_recipes() {
        let file = recipe_file();
        let recipes = read_recipes(file.path()).unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[1].title, "Beef Stew");
    }

    #[test]
    fn test_read_recipes_reports_path() {
        let err = read_recipes(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[tokio::test]
    async fn test_collection_requires_source() {
        let ctx = AppContext::open(in_memory(), None).await.unwrap();
        assert!(matches!(ctx.collection().await, Err(CliError::NoRecipeSource)));
    }

    #[tokio::test]
    async fn test_collection_uses_default_sort() {
        let file = recipe_file();
        let mut config = in_memory();
        config.recipes.default_sort = foodie_core::SortKey::Time;

        let ctx = AppContext::open(config, Some(file.path().to_path_buf()))
            .await
            .unwrap();
        let collection = ctx.collection().await.unwrap();
        assert_eq!(collection.total_count(), 2);
        assert_eq!(collection.filtered_recipes()[0].id, "r1");
    }
}
