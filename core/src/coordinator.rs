//! Dispatches recipe and favorite mutations to the remote service.
//!
//! At most one operation per `(recipe, action)` is outstanding at a time. A
//! successful mutation is followed by a refetch of the affected collections;
//! local state is never patched from a mutation's own response.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::models::{Favorite, NewRecipe, Recipe, RecipeId};
use crate::remote::{FavoriteService, RecipeService};
use crate::session::{Credential, SessionSource};
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Delete,
    Favorite,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Create => write!(f, "create"),
            ActionKind::Delete => write!(f, "delete"),
            ActionKind::Favorite => write!(f, "favorite update"),
        }
    }
}

/// Which way a favorite toggle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteChange {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshScope {
    Recipes,
    RecipesAndFavorites,
}

type InFlightKey = (RecipeId, ActionKind);

/// Marks a key in flight for as long as it lives.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<InFlightKey>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Ticket of the newest refresh applied to each collection. Recipe and
/// favorite collections advance independently since a refresh may carry
/// only recipes.
#[derive(Debug, Default)]
struct AppliedTickets {
    recipes: u64,
    favorites: u64,
}

/// Collections fetched by one refresh, applied together.
struct Snapshot {
    recipes: Vec<Recipe>,
    own_recipes: Vec<Recipe>,
    favorites: Option<Vec<Favorite>>,
}

pub struct MutationCoordinator {
    store: Arc<EntityStore>,
    recipes: Arc<dyn RecipeService>,
    favorites: Arc<dyn FavoriteService>,
    session: Arc<dyn SessionSource>,
    in_flight: Mutex<HashSet<InFlightKey>>,
    refresh_seq: AtomicU64,
    applied: Mutex<AppliedTickets>,
}

impl MutationCoordinator {
    pub fn new(
        store: Arc<EntityStore>,
        recipes: Arc<dyn RecipeService>,
        favorites: Arc<dyn FavoriteService>,
        session: Arc<dyn SessionSource>,
    ) -> Self {
        Self {
            store,
            recipes,
            favorites,
            session,
            in_flight: Mutex::new(HashSet::new()),
            refresh_seq: AtomicU64::new(0),
            applied: Mutex::new(AppliedTickets::default()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    #[must_use]
    pub fn is_in_flight(&self, id: &RecipeId, action: ActionKind) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(id.clone(), action))
    }

    pub async fn create(&self, payload: &NewRecipe) -> Result<Recipe, SyncError> {
        let credential = self.credential()?;
        if payload.title.trim().is_empty() {
            return Err(SyncError::invalid_target("recipe title is required"));
        }
        let _guard = self.begin(payload.dedup_key(), ActionKind::Create)?;

        debug!(title = %payload.title, "dispatching create");
        let created = self
            .recipes
            .create(payload, &credential)
            .await
            .inspect_err(|e| warn!(error = %e, "create failed"))?;
        info!(recipe_id = %created.id, "recipe created");

        self.refresh_after_mutation(RefreshScope::Recipes, &credential)
            .await;
        Ok(created)
    }

    pub async fn remove(&self, recipe_id: &RecipeId) -> Result<(), SyncError> {
        let credential = self.credential()?;
        Self::require_target(recipe_id)?;
        let _guard = self.begin(recipe_id.clone(), ActionKind::Delete)?;

        debug!(%recipe_id, "dispatching delete");
        self.recipes
            .delete(recipe_id, &credential)
            .await
            .inspect_err(|e| warn!(%recipe_id, error = %e, "delete failed"))?;
        info!(%recipe_id, "recipe deleted");

        self.refresh_after_mutation(RefreshScope::RecipesAndFavorites, &credential)
            .await;
        Ok(())
    }

    /// Adds or removes a favorite. `currently_favorite` must reflect the
    /// favorite collection at call time; it selects the remote call.
    pub async fn toggle_favorite(
        &self,
        recipe_id: &RecipeId,
        currently_favorite: bool,
    ) -> Result<(), SyncError> {
        let credential = self.credential()?;
        Self::require_target(recipe_id)?;
        let _guard = self.begin(recipe_id.clone(), ActionKind::Favorite)?;

        debug!(%recipe_id, currently_favorite, "dispatching favorite toggle");
        let sent = if currently_favorite {
            self.favorites.remove(recipe_id, &credential).await
        } else {
            self.favorites.add(recipe_id, &credential).await
        };
        sent.inspect_err(|e| warn!(%recipe_id, error = %e, "favorite update failed"))?;
        info!(%recipe_id, removed = currently_favorite, "favorite updated");

        self.refresh_after_mutation(RefreshScope::RecipesAndFavorites, &credential)
            .await;
        Ok(())
    }

    /// Toggles using the store's current favorite membership.
    pub async fn toggle_favorite_current(
        &self,
        recipe_id: &RecipeId,
    ) -> Result<FavoriteChange, SyncError> {
        let currently_favorite = self.store.is_favorite(recipe_id);
        self.toggle_favorite(recipe_id, currently_favorite).await?;
        Ok(if currently_favorite {
            FavoriteChange::Removed
        } else {
            FavoriteChange::Added
        })
    }

    /// Initial load. Without a credential only the public recipe list is
    /// fetched and the per-user collections are emptied.
    pub async fn refresh_all(&self) -> Result<(), SyncError> {
        match self.session.credential() {
            Some(credential) => {
                self.refresh(RefreshScope::RecipesAndFavorites, &credential)
                    .await
            }
            None => {
                let ticket = self.next_ticket();
                let recipes = self.recipes.list_all(None).await?;
                self.apply(
                    ticket,
                    Snapshot {
                        recipes,
                        own_recipes: Vec::new(),
                        favorites: Some(Vec::new()),
                    },
                );
                Ok(())
            }
        }
    }

    fn credential(&self) -> Result<Credential, SyncError> {
        self.session.credential().ok_or(SyncError::Unauthenticated)
    }

    fn require_target(recipe_id: &RecipeId) -> Result<(), SyncError> {
        if recipe_id.is_blank() {
            return Err(SyncError::invalid_target("missing recipe id"));
        }
        Ok(())
    }

    fn begin(&self, id: RecipeId, action: ActionKind) -> Result<InFlightGuard<'_>, SyncError> {
        let key = (id, action);
        let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if set.contains(&key) {
            debug!(recipe_id = %key.0, %action, "rejecting duplicate in-flight mutation");
            return Err(SyncError::OperationInProgress {
                recipe_id: key.0,
                action,
            });
        }
        set.insert(key.clone());
        Ok(InFlightGuard {
            set: &self.in_flight,
            key,
        })
    }

    /// The mutation already succeeded remotely, so a failed refetch only
    /// leaves the store at its last consistent state.
    async fn refresh_after_mutation(&self, scope: RefreshScope, credential: &Credential) {
        if let Err(e) = self.refresh(scope, credential).await {
            warn!(error = %e, "refresh after mutation failed; keeping previous collections");
        }
    }

    async fn refresh(&self, scope: RefreshScope, credential: &Credential) -> Result<(), SyncError> {
        let ticket = self.next_ticket();
        let recipes = self.recipes.list_all(Some(credential)).await?;
        let own_recipes = self.recipes.list_for_user(credential).await?;
        let favorites = match scope {
            RefreshScope::RecipesAndFavorites => {
                Some(self.favorites.list_for_user(credential).await?)
            }
            RefreshScope::Recipes => None,
        };
        self.apply(
            ticket,
            Snapshot {
                recipes,
                own_recipes,
                favorites,
            },
        );
        Ok(())
    }

    fn next_ticket(&self) -> u64 {
        self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Applies each collection in a snapshot unless a refresh that started
    /// later already replaced that collection. Returns false when nothing
    /// was applied.
    fn apply(&self, ticket: u64, snapshot: Snapshot) -> bool {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;

        if ticket >= applied.recipes {
            applied.recipes = ticket;
            self.store.replace_recipes(snapshot.recipes);
            self.store.replace_own_recipes(snapshot.own_recipes);
            changed = true;
        } else {
            debug!(ticket, applied = applied.recipes, "discarding superseded recipes");
        }

        if let Some(favorites) = snapshot.favorites {
            if ticket >= applied.favorites {
                applied.favorites = ticket;
                self.store.replace_favorites(favorites);
                changed = true;
            } else {
                debug!(ticket, applied = applied.favorites, "discarding superseded favorites");
            }
        }

        if changed {
            debug!(ticket, "applied refresh");
        }
        changed
    }
}
