//! Remote services the synchronization layer talks to.
//!
//! Implementations map failure statuses to [`SyncError::RemoteRejected`] and
//! everything that prevents a response to [`SyncError::TransportFailure`].

use async_trait::async_trait;

use crate::error::SyncError;
use crate::models::{Favorite, NewRecipe, Recipe, RecipeId};
use crate::session::Credential;

#[async_trait]
pub trait RecipeService: Send + Sync {
    /// Every recipe visible to the caller. The credential is optional here.
    async fn list_all(&self, credential: Option<&Credential>) -> Result<Vec<Recipe>, SyncError>;

    async fn create(&self, recipe: &NewRecipe, credential: &Credential)
    -> Result<Recipe, SyncError>;

    async fn delete(&self, id: &RecipeId, credential: &Credential) -> Result<(), SyncError>;

    /// Recipes owned by the credential's user.
    async fn list_for_user(&self, credential: &Credential) -> Result<Vec<Recipe>, SyncError>;
}

#[async_trait]
pub trait FavoriteService: Send + Sync {
    async fn add(&self, id: &RecipeId, credential: &Credential) -> Result<(), SyncError>;

    async fn remove(&self, id: &RecipeId, credential: &Credential) -> Result<(), SyncError>;

    async fn list_for_user(&self, credential: &Credential) -> Result<Vec<Favorite>, SyncError>;
}
