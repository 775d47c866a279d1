//! User model for Danke.
//!
//! Users are owned by the external identity provider. The local table only
//! mirrors the fields the board logic needs.

use chrono::{DateTime, Utc};

use crate::policy::Viewer;

/// Mirrored user record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// User ID issued by the identity provider.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Primary email address.
    pub email: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// First time the user was seen.
    pub created_at: DateTime<Utc>,
    /// Last time the mirror was refreshed.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The user as seen by the policy engine.
    pub fn viewer(&self) -> Viewer {
        Viewer::new(&self.id, &self.email)
    }
}

/// Identity data received from the identity provider.
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// User ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Primary email address.
    pub email: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Create a new profile.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar_url: None,
        }
    }

    /// Set the avatar URL.
    #[cfg(test)]
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}
