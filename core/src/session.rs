//! Credential and identity supplied by the session collaborator.

use std::fmt;
use std::sync::RwLock;

use crate::models::User;

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty token so absence is handled in one place.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    #[must_use]
    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Supplies the credential and current user. The core only reads from it.
pub trait SessionSource: Send + Sync {
    fn credential(&self) -> Option<Credential>;
    fn current_user(&self) -> Option<User>;
}

/// In-memory session, for callers that already hold the token and user.
#[derive(Debug, Default)]
pub struct StaticSession {
    inner: RwLock<(Option<Credential>, Option<User>)>,
}

impl StaticSession {
    #[must_use]
    pub fn new(credential: Option<Credential>, user: Option<User>) -> Self {
        Self {
            inner: RwLock::new((credential, user)),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Drops the credential, as on logout.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *inner = (None, None);
    }
}

impl SessionSource for StaticSession {
    fn credential(&self) -> Option<Credential> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .0
            .clone()
    }

    fn current_user(&self) -> Option<User> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .1
            .clone()
    }
}
