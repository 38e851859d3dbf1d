//! In-memory holder of the synchronized collections.
//!
//! Writes are whole-collection swaps; nothing is ever patched in place.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::models::{CollectionStats, Favorite, Recipe, RecipeId, User};
use crate::ordering::ordered_recipes;

#[derive(Debug, Default)]
struct Collections {
    recipes: Arc<Vec<Recipe>>,
    own_recipes: Arc<Vec<Recipe>>,
    favorites: Arc<Vec<Favorite>>,
    generation: u64,
}

#[derive(Debug)]
pub struct EntityStore {
    user: Option<User>,
    collections: RwLock<Collections>,
    ordered: Mutex<Option<(u64, Arc<Vec<Recipe>>)>>,
}

impl EntityStore {
    /// Creates an empty store for the session's user.
    #[must_use]
    pub fn new(user: Option<User>) -> Self {
        Self {
            user,
            collections: RwLock::new(Collections::default()),
            ordered: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn recipes(&self) -> Arc<Vec<Recipe>> {
        Arc::clone(&self.read().recipes)
    }

    #[must_use]
    pub fn own_recipes(&self) -> Arc<Vec<Recipe>> {
        Arc::clone(&self.read().own_recipes)
    }

    #[must_use]
    pub fn favorites(&self) -> Arc<Vec<Favorite>> {
        Arc::clone(&self.read().favorites)
    }

    /// Bumped by every replace; lets callers detect that a view is stale.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    #[must_use]
    pub fn recipe(&self, id: &RecipeId) -> Option<Recipe> {
        self.read().recipes.iter().find(|r| &r.id == id).cloned()
    }

    #[must_use]
    pub fn is_favorite(&self, id: &RecipeId) -> bool {
        self.read().favorites.iter().any(|f| &f.recipe_id == id)
    }

    /// Swaps in a fresh recipe collection and drops favorites it no longer covers.
    pub fn replace_recipes(&self, recipes: Vec<Recipe>) {
        let recipes = dedup_by(recipes, |r| r.id.clone(), "recipe");
        let mut state = self.write();
        let known: HashSet<&RecipeId> = recipes.iter().map(|r| &r.id).collect();
        if state
            .favorites
            .iter()
            .any(|f| !known.contains(&f.recipe_id))
        {
            let kept = prune_favorites(state.favorites.as_ref().clone(), &known);
            state.favorites = Arc::new(kept);
        }
        debug!(count = recipes.len(), "replaced recipe collection");
        state.recipes = Arc::new(recipes);
        state.generation += 1;
        drop(state);
        self.invalidate_ordered();
    }

    pub fn replace_own_recipes(&self, recipes: Vec<Recipe>) {
        let recipes = dedup_by(recipes, |r| r.id.clone(), "own recipe");
        let mut state = self.write();
        debug!(count = recipes.len(), "replaced own recipe collection");
        state.own_recipes = Arc::new(recipes);
        state.generation += 1;
    }

    /// Swaps in a fresh favorite collection, keeping only favorites whose
    /// recipe is present in the current recipe collection.
    pub fn replace_favorites(&self, favorites: Vec<Favorite>) {
        let favorites = dedup_by(favorites, |f| f.recipe_id.clone(), "favorite");
        let mut state = self.write();
        let kept = {
            let known: HashSet<&RecipeId> = state.recipes.iter().map(|r| &r.id).collect();
            prune_favorites(favorites, &known)
        };
        debug!(count = kept.len(), "replaced favorite collection");
        state.favorites = Arc::new(kept);
        state.generation += 1;
        drop(state);
        self.invalidate_ordered();
    }

    /// The recipe collection in display order, cached until the next replace.
    #[must_use]
    pub fn ordered_recipes(&self) -> Arc<Vec<Recipe>> {
        let (generation, recipes) = {
            let state = self.read();
            (state.generation, Arc::clone(&state.recipes))
        };
        let mut cache = self.ordered.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_gen, view)) = cache.as_ref() {
            if *cached_gen == generation {
                return Arc::clone(view);
            }
        }
        let view = Arc::new(ordered_recipes(&recipes, self.user.as_ref()));
        *cache = Some((generation, Arc::clone(&view)));
        view
    }

    #[must_use]
    pub fn stats(&self) -> CollectionStats {
        let state = self.read();
        CollectionStats {
            own_recipes: state.own_recipes.len(),
            favorites: state.favorites.len(),
            all_recipes: state.recipes.len(),
            latest_own: state.own_recipes.last().cloned(),
            latest_favorite: state.favorites.last().cloned(),
        }
    }

    fn invalidate_ordered(&self) {
        *self.ordered.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn prune_favorites(favorites: Vec<Favorite>, known: &HashSet<&RecipeId>) -> Vec<Favorite> {
    let before = favorites.len();
    let kept: Vec<Favorite> = favorites
        .into_iter()
        .filter(|f| known.contains(&f.recipe_id))
        .collect();
    if kept.len() < before {
        warn!(
            dropped = before - kept.len(),
            "dropped favorites without a matching recipe"
        );
    }
    kept
}

/// Keeps the first record for each key, preserving fetch order.
fn dedup_by<T>(items: Vec<T>, key: impl Fn(&T) -> RecipeId, kind: &str) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    let before = items.len();
    let unique: Vec<T> = items.into_iter().filter(|i| seen.insert(key(i))).collect();
    if unique.len() < before {
        warn!(
            kind,
            duplicates = before - unique.len(),
            "collection contained duplicate identifiers"
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    fn user(id: &str) -> User {
        User {
            id: UserId::from(id),
            name: "Ada".to_string(),
            username: "ada".to_string(),
        }
    }

    fn recipe(id: &str, owner: &str) -> Recipe {
        Recipe {
            id: RecipeId::from(id),
            title: format!("Recipe {id}"),
            cuisine: "Unknown".to_string(),
            ingredients: vec![],
            owner: Some(UserId::from(owner)),
            created_at: None,
        }
    }

    fn favorite(id: &str) -> Favorite {
        Favorite {
            recipe_id: RecipeId::from(id),
            title: None,
            added_at: None,
        }
    }

    fn ids<T>(items: &[T], f: impl Fn(&T) -> &RecipeId) -> Vec<String> {
        items.iter().map(|i| f(i).to_string()).collect()
    }

    #[test]
    fn test_starts_empty() {
        let store = EntityStore::new(None);
        assert!(store.recipes().is_empty());
        assert!(store.favorites().is_empty());
        assert!(store.current_user().is_none());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_replace_recipes_swaps_whole_collection() {
        let store = EntityStore::new(Some(user("u1")));
        store.replace_recipes(vec![recipe("r1", "u1"), recipe("r2", "u2")]);
        let before = store.recipes();
        store.replace_recipes(vec![recipe("r3", "u2")]);
        assert_eq!(ids(&store.recipes(), |r| &r.id), vec!["r3"]);
        // Earlier snapshots are unaffected by the swap.
        assert_eq!(ids(&before, |r| &r.id), vec!["r1", "r2"]);
    }

    #[test]
    fn test_favorites_without_recipe_are_dropped() {
        let store = EntityStore::new(Some(user("u1")));
        store.replace_recipes(vec![recipe("r1", "u1")]);
        store.replace_favorites(vec![favorite("r1"), favorite("gone")]);
        assert_eq!(ids(&store.favorites(), |f| &f.recipe_id), vec!["r1"]);
    }

    #[test]
    fn test_recipe_replace_prunes_stale_favorites() {
        let store = EntityStore::new(Some(user("u1")));
        store.replace_recipes(vec![recipe("r1", "u1"), recipe("r2", "u1")]);
        store.replace_favorites(vec![favorite("r1"), favorite("r2")]);
        store.replace_recipes(vec![recipe("r2", "u1")]);
        assert_eq!(ids(&store.favorites(), |f| &f.recipe_id), vec!["r2"]);
        assert!(!store.is_favorite(&RecipeId::from("r1")));
        assert!(store.is_favorite(&RecipeId::from("r2")));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let store = EntityStore::new(None);
        let mut dup = recipe("r1", "u2");
        dup.title = "Second".to_string();
        store.replace_recipes(vec![recipe("r1", "u1"), recipe("r2", "u1"), dup]);
        let recipes = store.recipes();
        assert_eq!(ids(&recipes, |r| &r.id), vec!["r1", "r2"]);
        assert_eq!(recipes[0].title, "Recipe r1");
    }

    #[test]
    fn test_ordered_view_is_cached_and_invalidated() {
        let store = EntityStore::new(Some(user("u1")));
        store.replace_recipes(vec![recipe("a", "u2"), recipe("b", "u1")]);
        let first = store.ordered_recipes();
        assert_eq!(ids(&first, |r| &r.id), vec!["b", "a"]);
        assert!(Arc::ptr_eq(&first, &store.ordered_recipes()));

        store.replace_recipes(vec![recipe("c", "u2"), recipe("d", "u1")]);
        let second = store.ordered_recipes();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(ids(&second, |r| &r.id), vec!["d", "c"]);
    }

    #[test]
    fn test_lookup_and_stats() {
        let store = EntityStore::new(Some(user("u1")));
        store.replace_recipes(vec![recipe("r1", "u1"), recipe("r2", "u2")]);
        store.replace_own_recipes(vec![recipe("r1", "u1")]);
        store.replace_favorites(vec![favorite("r2")]);

        assert_eq!(
            store.recipe(&RecipeId::from("r2")).unwrap().title,
            "Recipe r2"
        );
        assert!(store.recipe(&RecipeId::from("nope")).is_none());

        let stats = store.stats();
        assert_eq!(stats.all_recipes, 2);
        assert_eq!(stats.own_recipes, 1);
        assert_eq!(stats.favorites, 1);
        assert_eq!(stats.latest_own.unwrap().id, RecipeId::from("r1"));
        assert_eq!(
            stats.latest_favorite.unwrap().recipe_id,
            RecipeId::from("r2")
        );
        assert_eq!(store.generation(), 3);
    }
}
