//! Request DTOs for the web API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::validation::{
    domain_entries, email_entries, http_urls, no_control_chars, not_empty_trimmed,
};
use crate::board::{BoardUpdate, NewBoard, NewPost};
use crate::policy::{AccessPolicy, BoardVisibility, ModerationAction, PostingMode};
use crate::{DankeError, Result};

/// Distinguish a missing field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Board creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    /// Board title.
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1-100 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub title: String,
    /// Name of the person the board is for.
    #[validate(
        length(min = 1, max = 100, message = "Recipient name must be 1-100 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub recipient_name: String,
    /// Board type.
    #[serde(default)]
    pub board_type: Option<String>,
    /// Posting mode.
    #[serde(default)]
    pub posting_mode: PostingMode,
    /// Whether new posts need approval.
    #[serde(default)]
    pub moderation_enabled: bool,
    /// Whether anonymous posts are allowed.
    #[serde(default = "default_true")]
    pub allow_anonymous: bool,
    /// Per-user post cap.
    #[serde(default)]
    #[validate(range(min = 1, message = "Must be a positive number"))]
    pub max_posts_per_user: Option<u32>,
    /// Visibility.
    #[serde(default)]
    pub board_visibility: BoardVisibility,
    /// Allowed email domains.
    #[serde(default)]
    #[validate(length(max = 200), custom(function = "domain_entries"))]
    pub allowed_domains: Vec<String>,
    /// Blocked email domains.
    #[serde(default)]
    #[validate(length(max = 200), custom(function = "domain_entries"))]
    pub blocked_domains: Vec<String>,
    /// Allowed email addresses.
    #[serde(default)]
    #[validate(length(max = 200), custom(function = "email_entries"))]
    pub allowed_emails: Vec<String>,
    /// Blocked email addresses.
    #[serde(default)]
    #[validate(length(max = 200), custom(function = "email_entries"))]
    pub blocked_emails: Vec<String>,
    /// Expiration date.
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Per-board-type settings.
    #[serde(default)]
    pub type_config: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl CreateBoardRequest {
    /// Convert into the creation payload.
    pub fn into_new_board(self) -> NewBoard {
        let access = AccessPolicy::default()
            .with_allowed_domains(&self.allowed_domains)
            .with_blocked_domains(&self.blocked_domains)
            .with_allowed_emails(&self.allowed_emails)
            .with_blocked_emails(&self.blocked_emails)
            .with_expiration(self.expiration_date);

        let mut board = NewBoard::new(self.title, self.recipient_name)
            .with_posting_mode(self.posting_mode)
            .with_moderation(self.moderation_enabled)
            .with_allow_anonymous(self.allow_anonymous)
            .with_max_posts_per_user(self.max_posts_per_user)
            .with_access(access)
            .with_visibility(self.board_visibility);
        if let Some(board_type) = self.board_type.filter(|t| !t.trim().is_empty()) {
            board = board.with_board_type(board_type);
        }
        if let Some(type_config) = self.type_config {
            board = board.with_type_config(type_config);
        }
        board
    }
}

/// Board settings update request. Absent fields are left unchanged;
/// `null` clears the cap and the expiration date.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    /// New title.
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1-100 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub title: Option<String>,
    /// New recipient name.
    #[validate(length(min = 1, max = 100, message = "Recipient name must be 1-100 characters"))]
    pub recipient_name: Option<String>,
    /// New posting mode.
    pub posting_mode: Option<PostingMode>,
    /// New moderation flag.
    pub moderation_enabled: Option<bool>,
    /// New anonymous flag.
    pub allow_anonymous: Option<bool>,
    /// New per-user post cap.
    #[serde(default, deserialize_with = "double_option")]
    pub max_posts_per_user: Option<Option<u32>>,
    /// New visibility.
    pub board_visibility: Option<BoardVisibility>,
    /// New allowed domains.
    #[validate(length(max = 200), custom(function = "domain_entries"))]
    pub allowed_domains: Option<Vec<String>>,
    /// New blocked domains.
    #[validate(length(max = 200), custom(function = "domain_entries"))]
    pub blocked_domains: Option<Vec<String>>,
    /// New allowed emails.
    #[validate(length(max = 200), custom(function = "email_entries"))]
    pub allowed_emails: Option<Vec<String>>,
    /// New blocked emails.
    #[validate(length(max = 200), custom(function = "email_entries"))]
    pub blocked_emails: Option<Vec<String>>,
    /// New expiration date.
    #[serde(default, deserialize_with = "double_option")]
    pub expiration_date: Option<Option<DateTime<Utc>>>,
    /// New per-board-type settings.
    pub type_config: Option<serde_json::Value>,
}

impl UpdateBoardRequest {
    /// Convert into the update payload.
    pub fn into_update(self) -> BoardUpdate {
        BoardUpdate {
            title: self.title,
            recipient_name: self.recipient_name,
            posting_mode: self.posting_mode,
            moderation_enabled: self.moderation_enabled,
            allow_anonymous: self.allow_anonymous,
            max_posts_per_user: self.max_posts_per_user,
            visibility: self.board_visibility,
            allowed_domains: self.allowed_domains,
            blocked_domains: self.blocked_domains,
            allowed_emails: self.allowed_emails,
            blocked_emails: self.blocked_emails,
            expiration_date: self.expiration_date,
            type_config: self.type_config,
        }
    }
}

/// Post creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    /// Message content.
    #[validate(
        length(min = 1, max = 10000, message = "Content must be 1-10000 characters"),
        custom(function = "no_control_chars")
    )]
    pub content: String,
    /// Attached media URLs.
    #[serde(default)]
    #[validate(
        length(max = 10, message = "At most 10 attachments"),
        custom(function = "http_urls")
    )]
    pub media_urls: Vec<String>,
    /// Whether to hide the author.
    #[serde(default)]
    pub is_anonymous: bool,
    /// Display name for anonymous posts.
    #[serde(default)]
    #[validate(length(max = 50))]
    pub anonymous_name: Option<String>,
}

impl CreatePostRequest {
    /// Convert into the creation payload.
    pub fn into_new_post(self) -> NewPost {
        let post = NewPost::new(self.content).with_media_urls(self.media_urls);
        if self.is_anonymous {
            post.anonymous(self.anonymous_name)
        } else {
            post
        }
    }
}

/// Post edit request.
#[derive(Debug, Deserialize, Validate)]
pub struct EditPostRequest {
    /// New content.
    #[validate(
        length(min = 1, max = 10000, message = "Content must be 1-10000 characters"),
        custom(function = "no_control_chars")
    )]
    pub content: String,
    /// New media URLs; attachments are kept when absent.
    #[serde(default)]
    #[validate(
        length(max = 10, message = "At most 10 attachments"),
        custom(function = "http_urls")
    )]
    pub media_urls: Option<Vec<String>>,
}

/// Moderation action name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationActionKind {
    /// Approve the post.
    Approve,
    /// Ask the author for changes.
    RequestChange,
    /// Schedule the post for deletion.
    ScheduleDeletion,
    /// Delete the post now.
    Delete,
}

/// Moderation request.
///
/// Parameter rules (required reason, future delete date, reason length) are
/// checked by the moderation core so they surface as 400 errors.
#[derive(Debug, Deserialize, Validate)]
pub struct ModerationRequest {
    /// Action to apply.
    pub action: ModerationActionKind,
    /// Reason recorded with the decision.
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub reason: Option<String>,
    /// Deletion date for `schedule_deletion`.
    #[serde(default)]
    pub delete_date: Option<DateTime<Utc>>,
}

impl ModerationRequest {
    /// Convert into a moderation action.
    pub fn into_action(self) -> Result<ModerationAction> {
        let action = match self.action {
            ModerationActionKind::Approve => ModerationAction::Approve,
            ModerationActionKind::RequestChange => ModerationAction::RequestChange {
                reason: self.reason.unwrap_or_default(),
            },
            ModerationActionKind::ScheduleDeletion => ModerationAction::ScheduleDeletion {
                delete_date: self.delete_date.ok_or_else(|| {
                    DankeError::Validation("A delete date is required".to_string())
                })?,
                reason: self.reason,
            },
            ModerationActionKind::Delete => ModerationAction::Delete {
                reason: self.reason,
            },
        };
        Ok(action)
    }
}

/// Add moderator request.
#[derive(Debug, Deserialize, Validate)]
pub struct AddModeratorRequest {
    /// Email of the user to grant moderation rights to.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}
