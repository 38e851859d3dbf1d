//! Share a recipe link natively, falling back to the clipboard.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::models::RecipeId;

/// Failure reported by a platform share or clipboard call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("not available on this platform")]
    Unavailable,
    /// The user dismissed the share prompt.
    #[error("dismissed by the user")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
}

#[async_trait]
pub trait SharePlatform: Send + Sync {
    async fn native_share(&self, title: &str, text: &str, url: &str) -> Result<(), PlatformError>;
    async fn clipboard_write(&self, text: &str) -> Result<(), PlatformError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareOutcome {
    Shared,
    Copied,
    /// Not an error: the user closed the native share prompt.
    Cancelled,
}

pub struct ShareResolver {
    base_url: String,
    platform: Arc<dyn SharePlatform>,
}

impl ShareResolver {
    /// `base_url` is the scheme and host links are built on.
    pub fn new(base_url: impl Into<String>, platform: Arc<dyn SharePlatform>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            platform,
        }
    }

    #[must_use]
    pub fn locator(&self, recipe_id: &RecipeId) -> String {
        format!(
            "{}/recipe/{}",
            self.base_url,
            urlencoding::encode(recipe_id.as_str())
        )
    }

    pub async fn share(
        &self,
        recipe_id: &RecipeId,
        title: &str,
    ) -> Result<ShareOutcome, SyncError> {
        if recipe_id.is_blank() {
            return Err(SyncError::invalid_target("missing recipe id"));
        }
        let url = self.locator(recipe_id);
        let text = format!("Check out this recipe: {title}");

        let native = match self.platform.native_share(title, &text, &url).await {
            Ok(()) => {
                debug!(%recipe_id, "shared natively");
                return Ok(ShareOutcome::Shared);
            }
            Err(PlatformError::Cancelled) => {
                debug!(%recipe_id, "share cancelled by user");
                return Ok(ShareOutcome::Cancelled);
            }
            Err(e) => e,
        };
        debug!(%recipe_id, reason = %native, "native share unusable, copying link");

        match self.platform.clipboard_write(&url).await {
            Ok(()) => Ok(ShareOutcome::Copied),
            Err(clipboard) => {
                warn!(%recipe_id, native = %native, clipboard = %clipboard, "share failed");
                Err(SyncError::ShareFailed {
                    native: native.to_string(),
                    clipboard: clipboard.to_string(),
                })
            }
        }
    }
}
