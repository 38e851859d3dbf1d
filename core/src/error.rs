//! Error taxonomy shared by the store, coordinator and share resolver.

use thiserror::Error;

use crate::coordinator::ActionKind;
use crate::models::RecipeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// No credential is available from the session.
    #[error("You must be logged in to do that")]
    Unauthenticated,

    /// The recipe identifier is missing or does not name a usable recipe.
    #[error("Invalid target: {reason}")]
    InvalidTarget { reason: String },

    /// A mutation for the same recipe and action is still outstanding.
    #[error("A {action} for recipe {recipe_id} is already in progress")]
    OperationInProgress {
        recipe_id: RecipeId,
        action: ActionKind,
    },

    /// The service answered with a failure status.
    #[error("Service rejected the request ({status}){}", message_suffix(.message.as_deref()))]
    RemoteRejected {
        status: u16,
        message: Option<String>,
    },

    /// The request never produced a usable response.
    #[error("Request failed: {0}")]
    TransportFailure(String),

    /// Native share and the clipboard fallback both failed.
    #[error("Failed to share recipe (share: {native}; clipboard: {clipboard})")]
    ShareFailed { native: String, clipboard: String },
}

fn message_suffix(message: Option<&str>) -> String {
    match message {
        Some(m) if !m.trim().is_empty() => format!(": {m}"),
        _ => String::new(),
    }
}

impl SyncError {
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }

    /// The service-provided message, when the service supplied one.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::RemoteRejected {
                message: Some(m), ..
            } if !m.trim().is_empty() => Some(m.as_str()),
            _ => None,
        }
    }

    /// True for failures detected locally before any remote call was made.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::InvalidTarget { .. } | Self::OperationInProgress { .. }
        )
    }
}
