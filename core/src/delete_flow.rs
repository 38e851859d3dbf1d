//! Confirm-before-destroy state machine for deleting a recipe.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::coordinator::MutationCoordinator;
use crate::error::SyncError;
use crate::models::{Recipe, RecipeId, User};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeleteState {
    #[default]
    Idle,
    Confirming {
        recipe_id: RecipeId,
        title: String,
    },
    Deleting {
        recipe_id: RecipeId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Another delete is awaiting confirmation")]
    NotIdle,
    #[error("No delete is awaiting confirmation")]
    NotConfirming,
    #[error("The recipe is already being deleted")]
    Busy,
    #[error("Only the owner can delete this recipe")]
    NotOwner,
    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Debug, Default)]
pub struct DeleteFlow {
    state: DeleteState,
}

impl DeleteFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &DeleteState {
        &self.state
    }

    /// `Idle -> Confirming`.
    pub fn request(
        &mut self,
        recipe_id: RecipeId,
        title: impl Into<String>,
    ) -> Result<(), FlowError> {
        match self.state {
            DeleteState::Idle => {}
            DeleteState::Confirming { .. } => return Err(FlowError::NotIdle),
            DeleteState::Deleting { .. } => return Err(FlowError::Busy),
        }
        if recipe_id.is_blank() {
            return Err(SyncError::invalid_target("missing recipe id").into());
        }
        debug!(%recipe_id, "awaiting delete confirmation");
        self.state = DeleteState::Confirming {
            recipe_id,
            title: title.into(),
        };
        Ok(())
    }

    /// Like [`request`](Self::request), but only for recipes `user` owns.
    pub fn request_owned(&mut self, recipe: &Recipe, user: Option<&User>) -> Result<(), FlowError> {
        if !user.is_some_and(|u| recipe.is_owned_by(u)) {
            return Err(FlowError::NotOwner);
        }
        self.request(recipe.id.clone(), recipe.title.clone())
    }

    /// `Confirming -> Idle` without any remote call. A running delete
    /// cannot be aborted.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        match self.state {
            DeleteState::Confirming { .. } => {
                self.state = DeleteState::Idle;
                Ok(())
            }
            DeleteState::Deleting { .. } => Err(FlowError::Busy),
            DeleteState::Idle => Err(FlowError::NotConfirming),
        }
    }

    /// `Confirming -> Deleting`, yielding the recipe to delete.
    pub fn begin(&mut self) -> Result<RecipeId, FlowError> {
        match std::mem::take(&mut self.state) {
            DeleteState::Confirming { recipe_id, .. } => {
                self.state = DeleteState::Deleting {
                    recipe_id: recipe_id.clone(),
                };
                Ok(recipe_id)
            }
            other => {
                let err = if matches!(other, DeleteState::Deleting { .. }) {
                    FlowError::Busy
                } else {
                    FlowError::NotConfirming
                };
                self.state = other;
                Err(err)
            }
        }
    }

    /// `Deleting -> Idle` whatever the outcome; errors pass through.
    pub fn finish(&mut self, result: Result<(), SyncError>) -> Result<(), FlowError> {
        if !matches!(self.state, DeleteState::Deleting { .. }) {
            return Err(FlowError::NotConfirming);
        }
        self.state = DeleteState::Idle;
        result.map_err(FlowError::from)
    }

    /// Confirms the pending delete and runs it to completion.
    pub async fn confirm(&mut self, coordinator: &MutationCoordinator) -> Result<(), FlowError> {
        let recipe_id = self.begin()?;
        let result = coordinator.remove(&recipe_id).await;
        self.finish(result)
    }
}
