//! In-memory recipe service used by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::SyncError;
use crate::models::{Favorite, NewRecipe, Recipe, RecipeId, User, UserId};
use crate::remote::{FavoriteService, RecipeService};
use crate::session::Credential;

pub const OWNER: &str = "u1";

pub fn user() -> User {
    User {
        id: UserId::from(OWNER),
        name: "Ada Lovelace".to_string(),
        username: "ada".to_string(),
    }
}

pub fn recipe(id: &str, owner: &str) -> Recipe {
    Recipe {
        id: RecipeId::from(id),
        title: format!("Recipe {id}"),
        cuisine: "Unknown".to_string(),
        ingredients: vec![],
        owner: Some(UserId::from(owner)),
        created_at: None,
    }
}

pub fn favorite(id: &str) -> Favorite {
    Favorite {
        recipe_id: RecipeId::from(id),
        title: None,
        added_at: None,
    }
}

#[derive(Default)]
pub struct Calls {
    pub list_all: AtomicUsize,
    pub list_own: AtomicUsize,
    pub create: AtomicUsize,
    pub delete: AtomicUsize,
    pub add_favorite: AtomicUsize,
    pub remove_favorite: AtomicUsize,
    pub list_favorites: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        Self::get(&self.create)
            + Self::get(&self.delete)
            + Self::get(&self.add_favorite)
            + Self::get(&self.remove_favorite)
    }
}

/// Holds a mutation open until released, so tests can observe in-flight state.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
    armed: Mutex<bool>,
}

impl Gate {
    pub fn arm(&self) {
        *self.armed.lock().unwrap() = true;
    }

    async fn pass(&self) {
        let armed = std::mem::take(&mut *self.armed.lock().unwrap());
        if armed {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[derive(Default)]
pub struct FakeService {
    pub recipes: Mutex<Vec<Recipe>>,
    pub favorites: Mutex<Vec<RecipeId>>,
    pub calls: Calls,
    pub gate: Gate,
    /// Holds a favorites listing open, parking a refresh mid-fetch.
    pub favorites_gate: Gate,
    fail_next: Mutex<Option<SyncError>>,
    fail_lists: Mutex<bool>,
}

impl FakeService {
    pub fn with(recipes: Vec<Recipe>, favorites: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            recipes: Mutex::new(recipes),
            favorites: Mutex::new(favorites.iter().map(|f| RecipeId::from(*f)).collect()),
            ..Self::default()
        })
    }

    /// The next mutation fails with `err` instead of applying.
    pub fn fail_next(&self, err: SyncError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn fail_lists(&self, fail: bool) {
        *self.fail_lists.lock().unwrap() = fail;
    }

    fn take_failure(&self) -> Result<(), SyncError> {
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn check_lists(&self) -> Result<(), SyncError> {
        if *self.fail_lists.lock().unwrap() {
            return Err(SyncError::TransportFailure("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeService for FakeService {
    async fn list_all(&self, _credential: Option<&Credential>) -> Result<Vec<Recipe>, SyncError> {
        self.calls.list_all.fetch_add(1, Ordering::SeqCst);
        self.check_lists()?;
        Ok(self.recipes.lock().unwrap().clone())
    }

    async fn create(
        &self,
        recipe: &NewRecipe,
        _credential: &Credential,
    ) -> Result<Recipe, SyncError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        self.take_failure()?;
        let mut recipes = self.recipes.lock().unwrap();
        let created = Recipe {
            id: RecipeId::new(format!("new{}", recipes.len())),
            title: recipe.title.clone(),
            cuisine: recipe.cuisine.clone().unwrap_or_default(),
            ingredients: recipe.ingredients.clone(),
            owner: Some(UserId::from(OWNER)),
            created_at: None,
        };
        recipes.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: &RecipeId, _credential: &Credential) -> Result<(), SyncError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        self.take_failure()?;
        self.recipes.lock().unwrap().retain(|r| &r.id != id);
        Ok(())
    }

    async fn list_for_user(&self, _credential: &Credential) -> Result<Vec<Recipe>, SyncError> {
        self.calls.list_own.fetch_add(1, Ordering::SeqCst);
        self.check_lists()?;
        Ok(self
            .recipes
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.owner == Some(UserId::from(OWNER)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FavoriteService for FakeService {
    async fn add(&self, id: &RecipeId, _credential: &Credential) -> Result<(), SyncError> {
        self.calls.add_favorite.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        self.take_failure()?;
        self.favorites.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn remove(&self, id: &RecipeId, _credential: &Credential) -> Result<(), SyncError> {
        self.calls.remove_favorite.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        self.take_failure()?;
        self.favorites.lock().unwrap().retain(|f| f != id);
        Ok(())
    }

    /// Like the real service, favorites of deleted recipes may linger here;
    /// the store is responsible for dropping them.
    async fn list_for_user(&self, _credential: &Credential) -> Result<Vec<Favorite>, SyncError> {
        self.calls.list_favorites.fetch_add(1, Ordering::SeqCst);
        self.favorites_gate.pass().await;
        self.check_lists()?;
        Ok(self
            .favorites
            .lock()
            .unwrap()
            .iter()
            .map(|id| favorite(id.as_str()))
            .collect())
    }
}
