//! # Recipe Commands
//!
//! `recipes`, `categories`, `favorite` and `favorites`.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};
use foodie_core::{FavoriteToggle, Recipe, RecipeCollection, ALL_CATEGORIES};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::debug;

use crate::cli::RecipesArgs;
use crate::error::{CliError, CliResult};

/// One row of recipe output.
#[derive(Debug, Serialize)]
struct RecipeRow<'a> {
    #[serde(flatten)]
    recipe: &'a Recipe,
    favorite: bool,
}

/// Lists the filtered recipes.
pub fn list(collection: &mut RecipeCollection, args: &RecipesArgs, json: bool) -> CliResult<String> {
    if let Some(category) = &args.category {
        collection.filter_by_category(category);
    }
    if let Some(query) = &args.search {
        collection.search_recipes(query);
    }
    if let Some(sort) = args.sort {
        collection.set_sort_key(sort);
    }

    debug!(
        filter = %collection.current_filter(),
        query = %collection.search_query(),
        sort = %collection.sort_key(),
        "Listing recipes"
    );

    let visible = collection.filtered_recipes();
    if json {
        let rows: Vec<RecipeRow<'_>> = visible
            .iter()
            .map(|r| RecipeRow {
                recipe: r,
                favorite: collection.is_favorited(&r.id),
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&rows)?);
    }

    let mut out = render_table(&visible, |id| collection.is_favorited(id));
    let _ = writeln!(
        out,
        "\n{} of {} recipes",
        visible.len(),
        collection.total_count()
    );
    Ok(out)
}

/// Lists `all` plus every category.
pub fn categories(collection: &RecipeCollection, json: bool) -> CliResult<String> {
    let categories = collection.categories();
    if json {
        return Ok(serde_json::to_string_pretty(&categories)?);
    }

    let mut out = String::new();
    for category in &categories {
        let count = if category == ALL_CATEGORIES {
            collection.total_count()
        } else {
            collection
                .recipes()
                .iter()
                .filter(|r| &r.category == category)
                .count()
        };
        let _ = writeln!(out, "{:<16} {}", category, count);
    }
    Ok(out)
}

/// Toggles one favorite.
pub async fn toggle(collection: &mut RecipeCollection, id: &str) -> CliResult<String> {
    match collection.toggle_favorite(id).await {
        FavoriteToggle::Added => Ok(format!("★ Added {} to favorites", title(collection, id))),
        FavoriteToggle::Removed => {
            Ok(format!("☆ Removed {} from favorites", title(collection, id)))
        }
        FavoriteToggle::UnknownRecipe => Err(CliError::UnknownRecipe(id.to_string())),
    }
}

/// Lists favorite recipes in the order they were added.
pub fn favorites(collection: &RecipeCollection, json: bool) -> CliResult<String> {
    let favorites = collection.favorite_recipes();
    if json {
        return Ok(serde_json::to_string_pretty(&favorites)?);
    }
    if favorites.is_empty() {
        return Ok("No favorites yet. Add one with `foodie favorite <id>`.\n".to_string());
    }
    Ok(render_table(&favorites, |_| true))
}

fn title<'a>(collection: &'a RecipeCollection, id: &'a str) -> &'a str {
    collection
        .get_recipe(id)
        .map(|r| r.title.as_str())
        .unwrap_or(id)
}

fn render_table<F>(recipes: &[&Recipe], is_favorite: F) -> String
where
    F: Fn(&str) -> bool,
{
    format!("{}\n", recipe_table(recipes, is_favorite))
}

fn recipe_table<F>(recipes: &[&Recipe], is_favorite: F) -> Table
where
    F: Fn(&str) -> bool,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            header_cell(""),
            header_cell("ID"),
            header_cell("Title"),
            header_cell("Category"),
            header_cell("Difficulty"),
            header_cell("Min"),
            header_cell("Rating"),
        ]);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Right);

    for recipe in recipes {
        let marker = if is_favorite(&recipe.id) {
            Cell::new("★").fg(Color::Yellow)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            marker,
            Cell::new(&recipe.id),
            Cell::new(&recipe.title),
            Cell::new(&recipe.category),
            Cell::new(&recipe.difficulty),
            Cell::new(recipe.time),
            Cell::new(format!("{:.1}", recipe.rating)),
        ]);
    }

    table
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
