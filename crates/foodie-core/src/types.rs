//! # Domain Types
//!
//! Core domain types used throughout Foodie.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Recipe      │   │   Difficulty    │   │     SortKey     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (stable)    │   │  Easy    (1)    │   │  Name   (asc)   │       │
//! │  │  title          │   │  Medium  (2)    │   │  Rating (desc)  │       │
//! │  │  category       │   │  Hard    (3)    │   │  Time   (asc)   │       │
//! │  │  difficulty     │   │  Other   (2)    │   │  Difficulty     │       │
//! │  │  time/servings  │   └─────────────────┘   └─────────────────┘       │
//! │  │  rating         │                                                    │
//! │  └─────────────────┘   ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │NewsletterStatus │   │      Theme      │       │
//! │                        │  Subscribed     │   │  Light / Dark   │       │
//! │                        │  NotSubscribed  │   │  System         │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Recipes are immutable once loaded. Favorites are tracked by id in
//! [`crate::recipes::RecipeCollection`], never as a field on the recipe.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;

/// Highest rating a recipe can carry.
pub const MAX_RATING: f64 = 5.0;

// =============================================================================
// Difficulty
// =============================================================================

/// How hard a recipe is to cook.
///
/// Source data occasionally carries labels outside the three known ones
/// ("expert", "beginner", ...). Those are kept verbatim in `Other` so search
/// still matches them, and they sort as if they were `Medium`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Other(String),
}

impl Difficulty {
    /// Sort rank: easy 1, medium 2, hard 3, anything else 2.
    pub fn rank(&self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Other(_) => 2,
        }
    }

    /// Label as it appears in data and on the badge.
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Other(label) => label,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

impl From<&str> for Difficulty {
    fn from(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Other(label.to_string()),
        }
    }
}

impl From<String> for Difficulty {
    fn from(label: String) -> Self {
        Difficulty::from(label.as_str())
    }
}

impl From<Difficulty> for String {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.as_str().to_string()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// =============================================================================
// Recipe
// =============================================================================

/// A recipe card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Recipe {
    /// Unique, stable identifier. Numeric ids in source data are kept as
    /// their decimal string, so `1` and `"1"` name the same recipe.
    #[serde(deserialize_with = "id_from_text_or_number")]
    pub id: String,

    /// Display title.
    pub title: String,

    /// Category slug ("dessert", "main", ...).
    pub category: String,

    /// Difficulty badge.
    #[serde(default)]
    #[ts(as = "String")]
    pub difficulty: Difficulty,

    /// Total time in minutes.
    pub time: u32,

    /// Number of servings.
    pub servings: u32,

    /// Average rating, 0.0 to 5.0.
    pub rating: f64,

    /// Short teaser shown on the card.
    #[serde(default)]
    pub description: String,

    /// Image URI.
    #[serde(default)]
    pub image: String,

    /// Ingredients in listing order.
    #[serde(default)]
    pub ingredients: Vec<String>,

    /// Steps in cooking order.
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl Recipe {
    /// Checks the shape constraints a recipe must satisfy to be loaded.
    ///
    /// ## Rules
    /// - `id` and `title` must not be blank
    /// - `time` and `servings` must be positive
    /// - `rating` must be within 0.0..=5.0
    pub fn check(&self) -> Result<(), CoreError> {
        let invalid = |reason: &str| CoreError::InvalidRecipe {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id is required"));
        }
        if self.title.trim().is_empty() {
            return Err(invalid("title is required"));
        }
        if self.time == 0 {
            return Err(invalid("time must be positive"));
        }
        if self.servings == 0 {
            return Err(invalid("servings must be positive"));
        }
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(invalid("rating must be between 0 and 5"));
        }

        Ok(())
    }

    /// Case-insensitive substring match over title, description, category
    /// and difficulty. `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        [
            self.title.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            self.difficulty.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

fn id_from_text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Signed(id) => id.to_string(),
        RawId::Unsigned(id) => id.to_string(),
    })
}

// =============================================================================
// Sort Key
// =============================================================================

/// Ordering applied to the filtered recipe list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Title, ascending.
    #[default]
    Name,
    /// Rating, highest first.
    Rating,
    /// Cooking time, quickest first.
    Time,
    /// Difficulty rank, easiest first.
    Difficulty,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Name => write!(f, "name"),
            SortKey::Rating => write!(f, "rating"),
            SortKey::Time => write!(f, "time"),
            SortKey::Difficulty => write!(f, "difficulty"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "title" => Ok(SortKey::Name),
            "rating" => Ok(SortKey::Rating),
            "time" => Ok(SortKey::Time),
            "difficulty" => Ok(SortKey::Difficulty),
            other => Err(format!(
                "Unknown sort key: '{}'. Valid options: name, rating, time, difficulty",
                other
            )),
        }
    }
}

// =============================================================================
// Newsletter Status
// =============================================================================

/// Whether this browser/user has subscribed to the newsletter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NewsletterStatus {
    Subscribed,
    #[default]
    NotSubscribed,
}

// =============================================================================
// Theme
// =============================================================================

/// Stored colour-scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

// =============================================================================
// Unit Tests
// =============================================================================
