//! Post model for Danke.

use chrono::{DateTime, Utc};

use crate::policy::ModerationStatus;
use crate::{DankeError, Result};

/// Maximum length for post content (in characters).
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Maximum number of media attachments per post.
pub const MAX_MEDIA_URLS: usize = 10;

/// Maximum length for the display name of an anonymous post.
pub const MAX_ANONYMOUS_NAME_LENGTH: usize = 50;

/// Post entity representing one appreciation message.
#[derive(Debug, Clone)]
pub struct Post {
    /// Unique post ID.
    pub id: String,
    /// ID of the board this post belongs to.
    pub board_id: String,
    /// ID of the user who created the post.
    pub creator_id: String,
    /// Message content.
    pub content: String,
    /// Attached media URLs (stored in the external blob store).
    pub media_urls: Vec<String>,
    /// Whether the author is hidden from other visitors.
    pub is_anonymous: bool,
    /// Display name shown instead of the author on anonymous posts.
    pub anonymous_name: Option<String>,
    /// Moderation status.
    pub moderation_status: ModerationStatus,
    /// Reason recorded with the last moderation decision.
    pub moderation_reason: Option<String>,
    /// Moderator who made the last decision.
    pub moderated_by: Option<String>,
    /// When the last decision was made.
    pub moderated_at: Option<DateTime<Utc>>,
    /// Scheduled deletion date.
    pub delete_scheduled_date: Option<DateTime<Utc>>,
    /// Moderator who scheduled the deletion.
    pub delete_scheduled_by: Option<String>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Check if the post is visible to a viewer without moderation rights.
    ///
    /// Approved posts are visible to everyone; authors also see their own
    /// posts whatever the status. Deleted posts are visible to no one.
    pub fn is_visible_to(&self, viewer_id: Option<&str>) -> bool {
        !self.is_deleted
            && (self.moderation_status == ModerationStatus::Approved
                || viewer_id == Some(self.creator_id.as_str()))
    }
}

/// Data for creating a new post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    /// Message content.
    pub content: String,
    /// Attached media URLs.
    pub media_urls: Vec<String>,
    /// Whether to hide the author.
    pub is_anonymous: bool,
    /// Display name for anonymous posts.
    pub anonymous_name: Option<String>,
}

impl NewPost {
    /// Create a new post with content only.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Attach media URLs.
    pub fn with_media_urls(mut self, urls: Vec<String>) -> Self {
        self.media_urls = urls;
        self
    }

    /// Post anonymously under an optional display name.
    pub fn anonymous(mut self, name: Option<String>) -> Self {
        self.is_anonymous = true;
        self.anonymous_name = name;
        self
    }

    /// Validate the post payload.
    pub fn validate(&self) -> Result<()> {
        validate_content(&self.content)?;
        if self.media_urls.len() > MAX_MEDIA_URLS {
            return Err(DankeError::Validation(format!(
                "A post may have at most {MAX_MEDIA_URLS} attachments"
            )));
        }
        if self.media_urls.iter().any(|u| u.trim().is_empty()) {
            return Err(DankeError::Validation("Media URL is empty".to_string()));
        }
        if let Some(ref name) = self.anonymous_name {
            if name.chars().count() > MAX_ANONYMOUS_NAME_LENGTH {
                return Err(DankeError::Validation(format!(
                    "Anonymous name must be at most {MAX_ANONYMOUS_NAME_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }
}

/// Validate a post content string.
pub fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(DankeError::Validation("Content is required".to_string()));
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(DankeError::Validation(format!(
            "Content must be at most {MAX_CONTENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// A pending post for unit tests, created just now.
#[cfg(test)]
pub(crate) fn test_post(board_id: &str, creator_id: &str) -> Post {
    let now = Utc::now();
    Post {
        id: "post-1".to_string(),
        board_id: board_id.to_string(),
        creator_id: creator_id.to_string(),
        content: "Thank you for everything".to_string(),
        media_urls: vec![],
        is_anonymous: false,
        anonymous_name: None,
        moderation_status: ModerationStatus::Pending,
        moderation_reason: None,
        moderated_by: None,
        moderated_at: None,
        delete_scheduled_date: None,
        delete_scheduled_by: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}
