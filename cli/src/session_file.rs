//! Bearer token and profile persisted between runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use larder_core::models::User;
use larder_core::session::{Credential, SessionSource};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    #[serde(default)]
    user: Option<User>,
}

#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    stored: Option<StoredSession>,
}

impl FileSession {
    /// Reads the session file; a missing file is an anonymous session.
    pub fn load(path: &Path) -> Result<Self> {
        let stored = if path.exists() {
            let raw = std::fs::read_to_string(path).context("Failed to read session file")?;
            let stored = serde_json::from_str(&raw)
                .context("Session file is corrupt; run `larder auth logout`")?;
            Some(stored)
        } else {
            None
        };
        Ok(Self {
            path: path.to_path_buf(),
            stored,
        })
    }

    pub fn save(path: &Path, credential: &Credential, user: Option<&User>) -> Result<()> {
        let stored = StoredSession {
            token: credential.bearer().to_string(),
            user: user.cloned(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&stored)?)
            .context("Failed to write session file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }
        Ok(())
    }

    /// Removes the local session. Returns false when there was none.
    pub fn clear(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path).context("Failed to remove session file")?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSource for FileSession {
    fn credential(&self) -> Option<Credential> {
        self.stored
            .as_ref()
            .and_then(|s| Credential::new(s.token.as_str()))
    }

    fn current_user(&self) -> Option<User> {
        self.stored.as_ref().and_then(|s| s.user.clone())
    }
}
