//! Moderator model for Danke.

use chrono::{DateTime, Utc};

/// Association granting a user moderation rights on a board.
///
/// The board creator is never stored here; creator rights are implicit.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Moderator {
    /// Unique association ID.
    pub id: String,
    /// Board the rights apply to.
    pub board_id: String,
    /// User holding the rights.
    pub user_id: String,
    /// Creator who granted the rights.
    pub added_by: String,
    /// When the rights were granted.
    pub created_at: DateTime<Utc>,
}

/// A moderator joined with the mirrored user profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModeratorWithUser {
    /// Unique association ID.
    pub id: String,
    /// User holding the rights.
    pub user_id: String,
    /// Display name of the user.
    pub name: String,
    /// Email of the user.
    pub email: String,
    /// Avatar URL of the user.
    pub avatar_url: Option<String>,
    /// Creator who granted the rights.
    pub added_by: String,
    /// When the rights were granted.
    pub created_at: DateTime<Utc>,
}
