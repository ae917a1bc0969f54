//! Command line argument definitions for `foodie`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foodie_core::SortKey;

#[derive(Debug, Parser)]
#[command(
    name = "foodie",
    version,
    about = "Browse recipes, keep favorites and join the newsletter",
    long_about = "Browse a recipe collection from the terminal.\n\n\
                  Favorites and newsletter status are kept in a local SQLite\n\
                  store shared by every run."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: platform config dir/config.toml).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Recipe JSON file (overrides [recipes] source).
    #[arg(long = "recipes", value_name = "PATH", global = true)]
    pub recipes: Option<PathBuf>,

    /// Print machine-readable JSON instead of a table.
    #[arg(long = "json", global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List recipes, optionally filtered, searched and sorted.
    Recipes(RecipesArgs),

    /// List recipe categories.
    Categories,

    /// Toggle a recipe in or out of the favorites.
    Favorite {
        /// Recipe id.
        id: String,
    },

    /// List favorite recipes.
    Favorites,

    /// Subscribe an email address to the newsletter.
    Subscribe {
        /// Address to subscribe.
        email: String,
    },

    /// Print the effective configuration.
    Config,
}

#[derive(Debug, clap::Args)]
pub struct RecipesArgs {
    /// Only show this category ("all" shows everything).
    #[arg(long = "category", value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Case-insensitive text to look for in title, description, category
    /// and difficulty.
    #[arg(long = "search", value_name = "TEXT")]
    pub search: Option<String>,

    /// Sort order: name, rating, time or difficulty.
    #[arg(long = "sort", value_name = "KEY")]
    pub sort: Option<SortKey>,
}
