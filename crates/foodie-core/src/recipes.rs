//! # Recipe Collection
//!
//! In-memory recipe list with category filter, free-text search, sort and
//! persisted favorites.
//!
//! ## Read Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   all recipes (source order)                                            │
//! │        │                                                                │
//! │        ▼  category == current_filter   (skipped for "all")              │
//! │        │                                                                │
//! │        ▼  matches trimmed query        (skipped when blank)             │
//! │        │                                                                │
//! │        ▼  stable sort by sort_key                                       │
//! │        │     name        A → Z, ignoring case and accents               │
//! │        │     rating      5 → 0                                          │
//! │        │     time        quick → slow                                   │
//! │        │     difficulty  easy → hard                                    │
//! │        ▼                                                                │
//! │   filtered_recipes()                                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The filtered list is recomputed on every read. Nothing is cached, so
//! changing the filter, query or sort key takes effect immediately.
//!
//! ## Lifecycle
//! `Uninitialized ──load()──► Loaded`. The transition happens once; loading
//! again is an error. Before loading, every read sees an empty collection.

use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::analytics::AnalyticsService;
use crate::error::{CoreError, CoreResult};
use crate::storage::StorageService;
use crate::types::{Recipe, SortKey};
use crate::ALL_CATEGORIES;

/// Result of [`RecipeCollection::toggle_favorite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    /// Recipe is now a favorite.
    Added,
    /// Recipe is no longer a favorite.
    Removed,
    /// No loaded recipe has that id; nothing changed.
    UnknownRecipe,
}

impl FavoriteToggle {
    /// Analytics action name, if anything changed.
    fn action(self) -> Option<&'static str> {
        match self {
            FavoriteToggle::Added => Some("favorite"),
            FavoriteToggle::Removed => Some("unfavorite"),
            FavoriteToggle::UnknownRecipe => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Uninitialized,
    Loaded,
}

/// The recipe list and the user's view onto it.
#[derive(Debug)]
pub struct RecipeCollection {
    storage: StorageService,
    analytics: AnalyticsService,
    load_state: LoadState,
    recipes: Vec<Recipe>,
    favorites: Vec<String>,
    current_filter: String,
    search_query: String,
    sort_key: SortKey,
}

impl RecipeCollection {
    pub fn new(storage: StorageService, analytics: AnalyticsService) -> Self {
        RecipeCollection {
            storage,
            analytics,
            load_state: LoadState::Uninitialized,
            recipes: Vec::new(),
            favorites: Vec::new(),
            current_filter: ALL_CATEGORIES.to_string(),
            search_query: String::new(),
            sort_key: SortKey::default(),
        }
    }

    pub fn with_sort_key(mut self, sort_key: SortKey) -> Self {
        self.sort_key = sort_key;
        self
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Reads the persisted favorite ids. Missing or unreadable data leaves
    /// the favorites empty.
    pub async fn load_favorites(&mut self) {
        let mut seen = HashSet::new();
        self.favorites = self
            .storage
            .favorites()
            .await
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        debug!(count = self.favorites.len(), "Loaded favorites");
    }

    /// Loads the recipe list. Recipes failing their shape check or
    /// repeating an earlier id are skipped with a warning.
    pub fn load(&mut self, recipes: Vec<Recipe>) -> CoreResult<()> {
        if self.load_state == LoadState::Loaded {
            return Err(CoreError::AlreadyLoaded {
                count: self.recipes.len(),
            });
        }

        let offered = recipes.len();
        let mut ids = HashSet::new();
        self.recipes = recipes
            .into_iter()
            .filter(|recipe| {
                if let Err(e) = recipe.check() {
                    warn!(error = %e, "Skipping recipe");
                    return false;
                }
                if !ids.insert(recipe.id.clone()) {
                    warn!(id = %recipe.id, "Skipping recipe with duplicate id");
                    return false;
                }
                true
            })
            .collect();
        self.load_state = LoadState::Loaded;

        info!(loaded = self.recipes.len(), offered, "Recipe collection loaded");
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state == LoadState::Loaded
    }

    // =========================================================================
    // View State
    // =========================================================================

    pub fn current_filter(&self) -> &str {
        &self.current_filter
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// Restricts the list to one category, or to everything with `"all"`.
    pub fn filter_by_category(&mut self, category: &str) {
        self.current_filter = category.to_string();
        debug!(category = %category, "Category filter changed");
        self.analytics.track_filter(category);
    }

    /// Sets the search query (stored verbatim). The tracked result count is
    /// the filtered count after the query applies.
    pub fn search_recipes(&mut self, query: &str) {
        self.search_query = query.to_string();
        let result_count = self.filtered_count();
        debug!(query = %query, result_count, "Search query changed");
        self.analytics.track_search(query, result_count);
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        self.sort_key = sort_key;
    }

    // =========================================================================
    // Derived Reads
    // =========================================================================

    /// Recipes visible under the current filter, query and sort key.
    pub fn filtered_recipes(&self) -> Vec<&Recipe> {
        let needle = self.search_query.trim().to_lowercase();

        let mut visible: Vec<&Recipe> = self
            .recipes
            .iter()
            .filter(|r| self.current_filter == ALL_CATEGORIES || r.category == self.current_filter)
            .filter(|r| needle.is_empty() || r.matches_query(&needle))
            .collect();

        visible.sort_by(|a, b| compare(self.sort_key, a, b));
        visible
    }

    /// `"all"` followed by each distinct category in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(
                self.recipes
                    .iter()
                    .filter(|r| seen.insert(r.category.as_str()))
                    .map(|r| r.category.clone()),
            )
            .collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_recipes().len()
    }

    pub fn total_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get_recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    pub fn is_favorited(&self, id: &str) -> bool {
        self.favorites.iter().any(|f| f == id)
    }

    /// Favorite ids in the order they were added.
    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    /// Favorite recipes in the order they were added.
    pub fn favorite_recipes(&self) -> Vec<&Recipe> {
        self.favorites
            .iter()
            .filter_map(|id| self.get_recipe(id))
            .collect()
    }

    /// Flips favorite membership for a loaded recipe and persists the list.
    ///
    /// Ids that no longer match a loaded recipe are dropped from the list
    /// at the same time. A failed write is logged; the in-memory change
    /// stands.
    pub async fn toggle_favorite(&mut self, id: &str) -> FavoriteToggle {
        if self.get_recipe(id).is_none() {
            debug!(id = %id, "Ignoring favorite toggle for unknown recipe");
            return FavoriteToggle::UnknownRecipe;
        }

        let outcome = if self.is_favorited(id) {
            self.favorites.retain(|f| f != id);
            FavoriteToggle::Removed
        } else {
            self.favorites.push(id.to_string());
            FavoriteToggle::Added
        };

        let known: HashSet<&str> = self.recipes.iter().map(|r| r.id.as_str()).collect();
        self.favorites.retain(|f| known.contains(f.as_str()));

        if !self.storage.set_favorites(&self.favorites).await {
            warn!(id = %id, "Favorites change not persisted");
        }

        if let Some(action) = outcome.action() {
            self.analytics.track_recipe_interaction(action, id);
        }

        outcome
    }
}

/// Ordering for one sort key. Callers use a stable sort, so equal recipes
/// keep source order.
fn compare(key: SortKey, a: &Recipe, b: &Recipe) -> Ordering {
    match key {
        SortKey::Name => collation_key(&a.title)
            .cmp(&collation_key(&b.title))
            .then_with(|| a.title.cmp(&b.title)),
        SortKey::Rating => b.rating.total_cmp(&a.rating),
        SortKey::Time => a.time.cmp(&b.time),
        SortKey::Difficulty => a.difficulty.rank().cmp(&b.difficulty.rank()),
    }
}

/// Title folded for name ordering: decomposed, accents dropped, lowercased.
/// "Éclair" sorts with "eclair", between "Apple Pie" and "Fudge".
fn collation_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{RecordingAnalytics, RECIPE_INTERACTION, SEARCH};
    use crate::error::StorageResult;
    use crate::keys;
    use crate::storage::KeyValueStore;
    use crate::types::Difficulty;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MapStore {
        data: Mutex<HashMap<String, Value>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
            self.data.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> StorageResult<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn recipe(id: &str, title: &str, category: &str, difficulty: &str, time: u32, rating: f64) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            difficulty: Difficulty::from(difficulty),
            time,
            servings: 4,
            rating,
            description: String::new(),
            image: String::new(),
            ingredients: vec![],
            instructions: vec![],
        }
    }

    fn sample() -> Vec<Recipe> {
        vec![
            recipe("r1", "Apple Pie", "dessert", "easy", 60, 4.8),
            recipe("r2", "Beef Stew", "main", "medium", 120, 4.5),
            recipe("r3", "Chocolate Cake", "dessert", "hard", 90, 4.9),
        ]
    }

    struct Fixture {
        collection: RecipeCollection,
        store: Arc<MapStore>,
        recorder: RecordingAnalytics,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MapStore::default());
        let recorder = RecordingAnalytics::new();
        let mut collection = RecipeCollection::new(
            StorageService::new(store.clone()),
            AnalyticsService::new(Arc::new(recorder.clone())),
        );
        collection.load(sample()).unwrap();
        Fixture {
            collection,
            store,
            recorder,
        }
    }

    fn titles(collection: &RecipeCollection) -> Vec<&str> {
        collection
            .filtered_recipes()
            .into_iter()
            .map(|r| r.title.as_str())
            .collect()
    }

    #[test]
    fn test_empty_before_load() {
        let collection = RecipeCollection::new(
            StorageService::new(Arc::new(MapStore::default())),
            AnalyticsService::disabled(),
        );
        assert!(!collection.is_loaded());
        assert!(collection.filtered_recipes().is_empty());
        assert_eq!(collection.categories(), vec!["all".to_string()]);
    }

    #[test]
    fn test_second_load_is_rejected() {
        let mut f = fixture();
        let err = f.collection.load(sample()).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyLoaded { count: 3 }));
    }

    #[test]
    fn test_load_skips_invalid_and_duplicate_recipes() {
        let mut collection = RecipeCollection::new(
            StorageService::new(Arc::new(MapStore::default())),
            AnalyticsService::disabled(),
        );
        let mut recipes = sample();
        recipes.push(recipe("r1", "Apple Pie Again", "dessert", "easy", 60, 4.0));
        recipes.push(recipe("r9", "Bad", "main", "easy", 0, 4.0));

        collection.load(recipes).unwrap();
        assert_eq!(collection.total_count(), 3);
    }

    #[test]
    fn test_categories_first_seen_order() {
        let f = fixture();
        assert_eq!(f.collection.categories(), vec!["all", "dessert", "main"]);
    }

    #[test]
    fn test_filter_dessert_sorted_by_name() {
        let mut f = fixture();
        f.collection.filter_by_category("dessert");
        assert_eq!(titles(&f.collection), vec!["Apple Pie", "Chocolate Cake"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut f = fixture();
        f.collection.search_recipes("  STEW ");
        assert_eq!(titles(&f.collection), vec!["Beef Stew"]);
        assert_eq!(f.collection.search_query(), "  STEW ");
    }

    #[test]
    fn test_search_tracks_result_count_after_update() {
        let mut f = fixture();
        f.collection.search_recipes("stew");

        let searches = f.recorder.events_named(SEARCH);
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0]["search_term"], "stew");
        assert_eq!(searches[0]["result_count"], 1);
    }

    #[test]
    fn test_filter_tracks_category() {
        let mut f = fixture();
        f.collection.filter_by_category("main");
        let events = f.recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "recipe_filter");
        assert_eq!(events[0].1["category"], "main");
    }

    #[test]
    fn test_sort_keys() {
        let mut f = fixture();

        f.collection.set_sort_key(SortKey::Rating);
        assert_eq!(
            titles(&f.collection),
            vec!["Chocolate Cake", "Apple Pie", "Beef Stew"]
        );

        f.collection.set_sort_key(SortKey::Time);
        assert_eq!(
            titles(&f.collection),
            vec!["Apple Pie", "Chocolate Cake", "Beef Stew"]
        );

        f.collection.set_sort_key(SortKey::Difficulty);
        assert_eq!(
            titles(&f.collection),
            vec!["Apple Pie", "Beef Stew", "Chocolate Cake"]
        );
    }

    #[test]
    fn test_sort_is_stable_and_case_insensitive() {
        let mut collection = RecipeCollection::new(
            StorageService::new(Arc::new(MapStore::default())),
            AnalyticsService::disabled(),
        );
        collection
            .load(vec![
                recipe("a", "banana bread", "bake", "expert", 50, 4.0),
                recipe("b", "Apricot Tart", "bake", "medium", 40, 4.0),
                recipe("c", "Cherry Clafoutis", "bake", "medium", 45, 4.0),
            ])
            .unwrap();

        assert_eq!(
            titles(&collection),
            vec!["Apricot Tart", "banana bread", "Cherry Clafoutis"]
        );

        // Equal ratings and equal difficulty ranks keep source order.
        collection.set_sort_key(SortKey::Rating);
        assert_eq!(
            titles(&collection),
            vec!["banana bread", "Apricot Tart", "Cherry Clafoutis"]
        );
        collection.set_sort_key(SortKey::Difficulty);
        assert_eq!(
            titles(&collection),
            vec!["banana bread", "Apricot Tart", "Cherry Clafoutis"]
        );
    }

    #[test]
    fn test_sort_by_name_ignores_accents() {
        let mut collection = RecipeCollection::new(
            StorageService::new(Arc::new(MapStore::default())),
            AnalyticsService::disabled(),
        );
        collection
            .load(vec![
                recipe("a", "Éclair", "pastry", "hard", 90, 4.7),
                recipe("b", "Fudge", "sweets", "easy", 30, 4.2),
                recipe("c", "Apple Pie", "dessert", "easy", 60, 4.8),
                recipe("d", "Crème brûlée", "dessert", "medium", 50, 4.9),
                recipe("e", "eclair", "pastry", "hard", 90, 4.0),
            ])
            .unwrap();

        assert_eq!(
            titles(&collection),
            vec!["Apple Pie", "Crème brûlée", "eclair", "Éclair", "Fudge"]
        );
    }

    #[tokio::test]
    async fn test_two_recipe_scenario_from_json() {
        let recipes: Vec<Recipe> = serde_json::from_str(
            r#"[
              {"id": 1, "title": "Apple Pie", "category": "dessert", "difficulty": "easy",
               "time": 60, "servings": 8, "rating": 4.8},
              {"id": 2, "title": "Beef Stew", "category": "main", "difficulty": "hard",
               "time": 120, "servings": 4, "rating": 4.5}
            ]"#,
        )
        .unwrap();

        let store = Arc::new(MapStore::default());
        let mut collection = RecipeCollection::new(
            StorageService::new(store.clone()),
            AnalyticsService::disabled(),
        );
        collection.load(recipes).unwrap();

        collection.filter_by_category("dessert");
        assert_eq!(collection.filtered_count(), 1);
        assert_eq!(collection.total_count(), 2);
        assert_eq!(titles(&collection), vec!["Apple Pie"]);

        assert_eq!(collection.toggle_favorite("1").await, FavoriteToggle::Added);
        assert!(collection.is_favorited("1"));
        assert_eq!(
            store.data.lock().unwrap().get(keys::FAVORITES).cloned(),
            Some(serde_json::json!(["1"]))
        );
        assert_eq!(
            collection.toggle_favorite("999").await,
            FavoriteToggle::UnknownRecipe
        );
        assert_eq!(collection.favorites(), ["1".to_string()]);
    }

    #[test]
    fn test_filter_matching_every_recipe_equals_all() {
        let mut collection = RecipeCollection::new(
            StorageService::new(Arc::new(MapStore::default())),
            AnalyticsService::disabled(),
        );
        collection
            .load(vec![
                recipe("b", "Brownies", "dessert", "easy", 40, 4.6),
                recipe("a", "Apple Pie", "dessert", "easy", 60, 4.8),
                recipe("c", "Chocolate Cake", "dessert", "hard", 90, 4.9),
            ])
            .unwrap();

        let everything: Vec<String> = titles(&collection).into_iter().map(String::from).collect();
        collection.filter_by_category("dessert");
        assert_eq!(titles(&collection), everything);
        assert_eq!(collection.filtered_count(), collection.total_count());

        collection.set_sort_key(SortKey::Rating);
        let dessert_by_rating: Vec<String> =
            titles(&collection).into_iter().map(String::from).collect();
        collection.filter_by_category(ALL_CATEGORIES);
        assert_eq!(titles(&collection), dessert_by_rating);
    }

    #[test]
    fn test_unknown_category_yields_nothing() {
        let mut f = fixture();
        f.collection.filter_by_category("breakfast");
        assert_eq!(f.collection.filtered_count(), 0);
        assert_eq!(f.collection.total_count(), 3);
    }

    #[tokio::test]
    async fn test_toggle_favorite_persists_and_tracks() {
        let mut f = fixture();

        assert_eq!(f.collection.toggle_favorite("r1").await, FavoriteToggle::Added);
        assert!(f.collection.is_favorited("r1"));
        assert_eq!(
            f.store.data.lock().unwrap()[keys::FAVORITES],
            serde_json::json!(["r1"])
        );

        assert_eq!(f.collection.toggle_favorite("r1").await, FavoriteToggle::Removed);
        assert!(!f.collection.is_favorited("r1"));
        assert_eq!(
            f.store.data.lock().unwrap()[keys::FAVORITES],
            serde_json::json!([])
        );

        let interactions = f.recorder.events_named(RECIPE_INTERACTION);
        assert_eq!(interactions.len(), 2);
        assert_eq!(interactions[0]["action"], "favorite");
        assert_eq!(interactions[1]["action"], "unfavorite");
        assert_eq!(interactions[1]["recipe_id"], "r1");
    }

    #[tokio::test]
    async fn test_toggle_unknown_recipe_is_noop() {
        let mut f = fixture();
        assert_eq!(
            f.collection.toggle_favorite("nope").await,
            FavoriteToggle::UnknownRecipe
        );
        assert!(f.collection.favorites().is_empty());
        assert!(f.store.data.lock().unwrap().is_empty());
        assert!(f.recorder.events().is_empty());
    }

    #[tokio::test]
    async fn test_load_favorites_and_prune_on_toggle() {
        let store = Arc::new(MapStore::default());
        store.data.lock().unwrap().insert(
            keys::FAVORITES.to_string(),
            serde_json::json!(["r3", "gone", "r3"]),
        );

        let mut collection = RecipeCollection::new(
            StorageService::new(store.clone()),
            AnalyticsService::disabled(),
        );
        collection.load_favorites().await;
        collection.load(sample()).unwrap();
        assert_eq!(collection.favorites(), &["r3".to_string(), "gone".to_string()]);

        collection.toggle_favorite("r1").await;
        assert_eq!(collection.favorites(), &["r3".to_string(), "r1".to_string()]);
        assert_eq!(
            store.data.lock().unwrap()[keys::FAVORITES],
            serde_json::json!(["r3", "r1"])
        );

        let titles: Vec<&str> = collection
            .favorite_recipes()
            .into_iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Chocolate Cake", "Apple Pie"]);
    }
}
