//! User-facing notices for the outcome of each action.

use serde::Serialize;

use crate::coordinator::FavoriteChange;
use crate::delete_flow::FlowError;
use crate::error::SyncError;
use crate::models::Recipe;
use crate::share::ShareOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }

    #[must_use]
    pub fn for_favorite(result: &Result<FavoriteChange, SyncError>) -> Self {
        match result {
            Ok(FavoriteChange::Added) => Self::success("Recipe added to favorites!"),
            Ok(FavoriteChange::Removed) => Self::success("Recipe removed from favorites!"),
            Err(SyncError::Unauthenticated) => {
                Self::error("You must be logged in to manage favorites.")
            }
            Err(SyncError::InvalidTarget { .. }) => {
                Self::error("Cannot favorite recipe: Missing recipe ID.")
            }
            Err(e) => failure("Failed to update favorites.", e),
        }
    }

    #[must_use]
    pub fn for_delete(result: &Result<(), FlowError>) -> Self {
        match result {
            Ok(()) => Self::success("Recipe deleted successfully!"),
            Err(FlowError::Sync(SyncError::Unauthenticated)) => {
                Self::error("Authentication token is missing. Cannot delete.")
            }
            Err(FlowError::Sync(SyncError::InvalidTarget { .. })) => {
                Self::error("Cannot delete recipe: Missing recipe ID.")
            }
            Err(FlowError::Sync(e)) => failure("Failed to delete recipe.", e),
            Err(e) => Self::error(e.to_string()),
        }
    }

    #[must_use]
    pub fn for_create(result: &Result<Recipe, SyncError>) -> Self {
        match result {
            Ok(recipe) => Self::success(format!("Created \"{}\"", recipe.title)),
            Err(SyncError::Unauthenticated) => {
                Self::error("You must be logged in to create recipes.")
            }
            Err(e) => failure("Failed to create recipe.", e),
        }
    }

    /// Shared and cancelled shares never produce an error-level notice.
    #[must_use]
    pub fn for_share(result: &Result<ShareOutcome, SyncError>) -> Self {
        match result {
            Ok(ShareOutcome::Shared) => Self::info("Recipe shared!"),
            Ok(ShareOutcome::Copied) => Self::success("Recipe link copied to clipboard!"),
            Ok(ShareOutcome::Cancelled) => Self::info("Share cancelled."),
            Err(SyncError::InvalidTarget { .. }) => {
                Self::error("Cannot share recipe: Missing recipe ID.")
            }
            Err(_) => Self::error("Failed to share recipe."),
        }
    }
}

/// Prefixes the service message when there is one.
fn failure(prefix: &str, err: &SyncError) -> Notice {
    match err {
        SyncError::OperationInProgress { action, .. } => {
            Notice::info(format!("A {action} for this recipe is already in progress."))
        }
        SyncError::RemoteRejected { .. } => match err.remote_message() {
            Some(m) => Notice::error(format!("{prefix} {m}")),
            None => Notice::error(prefix),
        },
        other => Notice::error(format!("{prefix} {other}")),
    }
}
