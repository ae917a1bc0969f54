//! # Commands
//!
//! One function per subcommand. Each returns the text to print so `main`
//! owns stdout and the functions stay testable.
//!
//! ```text
//! Cli ──► run() ──┬── config        (no store needed)
//!                 ├── subscribe     ──► NewsletterSignup
//!                 └── recipe cmds   ──► AppContext::collection() ──► RecipeCollection
//! ```

pub mod newsletter;
pub mod recipes;

use std::sync::Arc;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::context::{AppContext, LoggedSubscriber};
use crate::error::CliResult;

/// Runs the parsed command line against `config`.
pub async fn run(cli: Cli, config: AppConfig) -> CliResult<String> {
    if let Command::Config = cli.command {
        return show_config(&config, cli.json);
    }

    let ctx = AppContext::open(config, cli.recipes).await?;
    let result = dispatch(&ctx, cli.command, cli.json).await;
    ctx.close().await;
    result
}

async fn dispatch(ctx: &AppContext, command: Command, json: bool) -> CliResult<String> {
    debug!(?command, "Dispatching command");
    match command {
        Command::Recipes(args) => {
            let mut collection = ctx.collection().await?;
            recipes::list(&mut collection, &args, json)
        }
        Command::Categories => recipes::categories(&ctx.collection().await?, json),
        Command::Favorite { id } => {
            let mut collection = ctx.collection().await?;
            recipes::toggle(&mut collection, &id).await
        }
        Command::Favorites => recipes::favorites(&ctx.collection().await?, json),
        Command::Subscribe { email } => {
            newsletter::subscribe(
                Arc::new(LoggedSubscriber),
                ctx.storage.clone(),
                ctx.analytics.clone(),
                &email,
            )
            .await
        }
        Command::Config => show_config(&ctx.config, json),
    }
}

/// Prints the effective configuration.
pub fn show_config(config: &AppConfig, json: bool) -> CliResult<String> {
    if json {
        return Ok(serde_json::to_string_pretty(config)?);
    }
    Ok(config.to_toml()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use foodie_core::NewsletterStatus;

    fn config_with_db(dir: &tempfile::TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.database_path = Some(dir.path().join("foodie.db"));
        config
    }

    fn write_recipes(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("recipes.json");
        std::fs::write(
            &path,
            r#"[
              {"id": "r1", "title": "Apple Pie", "category": "dessert", "difficulty": "easy",
               "time": 60, "servings": 8, "rating": 4.8},
              {"id": "r2", "title": "Beef Stew", "category": "main", "difficulty": "medium",
               "time": 120, "servings": 4, "rating": 4.5}
            ]"#,
        )
        .unwrap();
        path
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[tokio::test]
    async fn test_config_command_skips_store() {
        let mut config = AppConfig::default();
        config.storage.database_path = Some("/proc/not/writable/foodie.db".into());

        let out = run(parse(&["foodie", "config"]), config).await.unwrap();
        assert!(out.contains("[storage]"));
        assert!(out.contains("/proc/not/writable/foodie.db"));
    }

    #[tokio::test]
    async fn test_favorite_persists_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let recipes = write_recipes(&dir);
        let recipes = recipes.to_str().unwrap();

        let out = run(
            parse(&["foodie", "favorite", "r1", "--recipes", recipes]),
            config_with_db(&dir),
        )
        .await
        .unwrap();
        assert!(out.contains("Added Apple Pie"));

        let out = run(
            parse(&["foodie", "favorites", "--json", "--recipes", recipes]),
            config_with_db(&dir),
        )
        .await
        .unwrap();
        let favorites: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0]["id"], "r1");
    }

    #[tokio::test]
    async fn test_recipes_without_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(parse(&["foodie", "recipes"]), config_with_db(&dir))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::CliError::NoRecipeSource));
    }

    #[tokio::test]
    async fn test_subscribe_is_remembered() {
        let dir = tempfile::tempdir().unwrap();
        run(
            parse(&["foodie", "subscribe", "cook@example.com"]),
            config_with_db(&dir),
        )
        .await
        .unwrap();

        let ctx = AppContext::open(config_with_db(&dir), None).await.unwrap();
        assert_eq!(
            ctx.storage.newsletter_status().await,
            NewsletterStatus::Subscribed
        );
        ctx.close().await;
    }
}
