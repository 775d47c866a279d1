//! Response DTOs for Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::{Board, BoardVisibility, ModeratorWithUser, Post, PostingMode};
use crate::config::FeaturesConfig;
use crate::policy::ModerationStatus;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Board details.
///
/// Tokens and access lists are only included for the board creator.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub id: String,
    pub title: String,
    pub recipient_name: String,
    pub creator_id: String,
    pub board_type: String,
    pub posting_mode: PostingMode,
    pub moderation_enabled: bool,
    pub allow_anonymous: bool,
    pub max_posts_per_user: Option<u32>,
    pub board_visibility: BoardVisibility,
    pub expiration_date: Option<DateTime<Utc>>,
    pub type_config: serde_json::Value,
    pub is_creator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<BoardSettingsResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creator-only board settings.
#[derive(Debug, Serialize)]
pub struct BoardSettingsResponse {
    /// Token for read access without an account.
    pub view_token: String,
    /// Token for posting access.
    pub post_token: String,
    pub allowed_domains: Vec<String>,
    pub blocked_domains: Vec<String>,
    pub allowed_emails: Vec<String>,
    pub blocked_emails: Vec<String>,
}

impl BoardResponse {
    /// Build the response as seen by `viewer_id`.
    pub fn from_board(board: Board, viewer_id: Option<&str>) -> Self {
        let is_creator = viewer_id == Some(board.creator_id.as_str());
        let settings = is_creator.then(|| BoardSettingsResponse {
            view_token: board.view_token.clone(),
            post_token: board.post_token.clone(),
            allowed_domains: board.access.allowed_domains.iter().cloned().collect(),
            blocked_domains: board.access.blocked_domains.iter().cloned().collect(),
            allowed_emails: board.access.allowed_emails.iter().cloned().collect(),
            blocked_emails: board.access.blocked_emails.iter().cloned().collect(),
        });

        Self {
            id: board.id,
            title: board.title,
            recipient_name: board.recipient_name,
            creator_id: board.creator_id,
            board_type: board.board_type,
            posting_mode: board.posting_mode,
            moderation_enabled: board.moderation_enabled,
            allow_anonymous: board.allow_anonymous,
            max_posts_per_user: board.max_posts_per_user,
            board_visibility: board.access.visibility,
            expiration_date: board.access.expires_at,
            type_config: board.type_config,
            is_creator,
            settings,
            created_at: board.created_at,
            updated_at: board.updated_at,
        }
    }
}

/// Post details.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub board_id: String,
    /// Hidden on anonymous posts unless the viewer wrote the post or
    /// moderates the board.
    pub creator_id: Option<String>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub is_anonymous: bool,
    pub anonymous_name: Option<String>,
    pub moderation_status: ModerationStatus,
    pub moderation_reason: Option<String>,
    pub moderated_by: Option<String>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub delete_scheduled_date: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    /// Build the response as seen by `viewer_id`.
    pub fn from_post(post: Post, viewer_id: Option<&str>, is_moderator: bool) -> Self {
        let reveal_author =
            !post.is_anonymous || is_moderator || viewer_id == Some(post.creator_id.as_str());

        Self {
            id: post.id,
            board_id: post.board_id,
            creator_id: reveal_author.then_some(post.creator_id),
            content: post.content,
            media_urls: post.media_urls,
            is_anonymous: post.is_anonymous,
            anonymous_name: post.anonymous_name,
            moderation_status: post.moderation_status,
            moderation_reason: post.moderation_reason,
            moderated_by: post.moderated_by,
            moderated_at: post.moderated_at,
            delete_scheduled_date: post.delete_scheduled_date,
            is_deleted: post.is_deleted,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Moderator entry with the mirrored user details.
#[derive(Debug, Serialize)]
pub struct ModeratorResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<ModeratorWithUser> for ModeratorResponse {
    fn from(m: ModeratorWithUser) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            avatar_url: m.avatar_url,
            added_by: m.added_by,
            created_at: m.created_at,
        }
    }
}

/// Public client configuration.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// Feature flags.
    pub features: FeaturesConfig,
}
