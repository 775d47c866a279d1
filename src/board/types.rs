//! Board model for Danke.
//!
//! This module defines the Board struct together with the creation and
//! update payloads and their validation rules.

use chrono::{DateTime, Utc};

use crate::policy::{AccessPolicy, BoardVisibility, PostingMode};
use crate::{DankeError, Result};

/// Maximum length for board titles (in characters).
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum length for recipient names (in characters).
pub const MAX_RECIPIENT_LENGTH: usize = 100;

/// Maximum number of entries in each allow/block list.
pub const MAX_LIST_ENTRIES: usize = 200;

/// Board entity representing an appreciation board.
#[derive(Debug, Clone)]
pub struct Board {
    /// Unique board ID.
    pub id: String,
    /// Opaque token granting read access through a shared link.
    pub view_token: String,
    /// Opaque token granting post-creation access through a shared link.
    pub post_token: String,
    /// Board title.
    pub title: String,
    /// Name of the person the board is for.
    pub recipient_name: String,
    /// User who created the board.
    pub creator_id: String,
    /// Board type (e.g. "appreciation", "birthday").
    pub board_type: String,
    /// Posting mode.
    pub posting_mode: PostingMode,
    /// Whether new posts start out pending.
    pub moderation_enabled: bool,
    /// Whether posts may hide their author.
    pub allow_anonymous: bool,
    /// Optional per-user post cap.
    pub max_posts_per_user: Option<u32>,
    /// Visibility, allow/block lists and expiration.
    pub access: AccessPolicy,
    /// Opaque per-board-type settings.
    pub type_config: serde_json::Value,
    /// Board creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Board {
    /// Whether posts on this board start out pending.
    pub fn initial_post_status(&self) -> crate::policy::ModerationStatus {
        if self.moderation_enabled {
            crate::policy::ModerationStatus::Pending
        } else {
            crate::policy::ModerationStatus::Approved
        }
    }

    /// Validate the settings of this board.
    pub fn validate(&self) -> Result<()> {
        validate_settings(
            &self.title,
            &self.recipient_name,
            self.posting_mode,
            self.max_posts_per_user,
            &self.access,
        )
    }
}

/// Checks shared by new and stored boards.
fn validate_settings(
    title: &str,
    recipient_name: &str,
    posting_mode: PostingMode,
    max_posts_per_user: Option<u32>,
    access: &AccessPolicy,
) -> Result<()> {
    validate_title(title)?;
    validate_recipient(recipient_name)?;
    validate_posting_rules(posting_mode, max_posts_per_user)?;
    validate_emails(access.allowed_emails.iter())?;
    validate_emails(access.blocked_emails.iter())?;
    validate_domains(access.allowed_domains.iter())?;
    validate_domains(access.blocked_domains.iter())?;
    Ok(())
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(DankeError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(DankeError::Validation(format!(
            "Title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_recipient(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DankeError::Validation(
            "Recipient name is required".to_string(),
        ));
    }
    if name.chars().count() > MAX_RECIPIENT_LENGTH {
        return Err(DankeError::Validation(format!(
            "Recipient name must be at most {MAX_RECIPIENT_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate the posting mode against the per-user cap.
///
/// A single-post board may not carry a cap above one.
fn validate_posting_rules(mode: PostingMode, max_posts_per_user: Option<u32>) -> Result<()> {
    match (mode, max_posts_per_user) {
        (_, Some(0)) => Err(DankeError::Validation(
            "Max posts per user must be a positive number".to_string(),
        )),
        (PostingMode::Single, Some(max)) if max > 1 => Err(DankeError::Validation(
            "Single posting mode allows at most one post per user".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_emails<'a>(emails: impl ExactSizeIterator<Item = &'a String>) -> Result<()> {
    if emails.len() > MAX_LIST_ENTRIES {
        return Err(DankeError::Validation(format!(
            "Email lists may contain at most {MAX_LIST_ENTRIES} entries"
        )));
    }
    for email in emails {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(DankeError::Validation(format!(
                "Invalid email address: {email}"
            )));
        }
    }
    Ok(())
}

fn validate_domains<'a>(domains: impl ExactSizeIterator<Item = &'a String>) -> Result<()> {
    if domains.len() > MAX_LIST_ENTRIES {
        return Err(DankeError::Validation(format!(
            "Domain lists may contain at most {MAX_LIST_ENTRIES} entries"
        )));
    }
    for domain in domains {
        if domain.contains('@') || !domain.contains('.') || domain.contains(char::is_whitespace)
        {
            return Err(DankeError::Validation(format!("Invalid domain: {domain}")));
        }
    }
    Ok(())
}

/// Data for creating a new board.
#[derive(Debug, Clone)]
pub struct NewBoard {
    /// Board title.
    pub title: String,
    /// Name of the person the board is for.
    pub recipient_name: String,
    /// Board type (defaults to "appreciation").
    pub board_type: String,
    /// Posting mode (defaults to Multiple).
    pub posting_mode: PostingMode,
    /// Whether new posts start out pending (defaults to false).
    pub moderation_enabled: bool,
    /// Whether anonymous posts are allowed (defaults to true).
    pub allow_anonymous: bool,
    /// Optional per-user post cap.
    pub max_posts_per_user: Option<u32>,
    /// Visibility, allow/block lists and expiration.
    pub access: AccessPolicy,
    /// Per-board-type settings.
    pub type_config: serde_json::Value,
}

impl NewBoard {
    /// Create a new board with minimal required fields.
    pub fn new(title: impl Into<String>, recipient_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            recipient_name: recipient_name.into(),
            board_type: "appreciation".to_string(),
            posting_mode: PostingMode::Multiple,
            moderation_enabled: false,
            allow_anonymous: true,
            max_posts_per_user: None,
            access: AccessPolicy::public(),
            type_config: serde_json::Value::Object(Default::default()),
        }
    }

    /// Set the board type.
    pub fn with_board_type(mut self, board_type: impl Into<String>) -> Self {
        self.board_type = board_type.into();
        self
    }

    /// Set the posting mode.
    pub fn with_posting_mode(mut self, mode: PostingMode) -> Self {
        self.posting_mode = mode;
        self
    }

    /// Enable or disable moderation.
    pub fn with_moderation(mut self, enabled: bool) -> Self {
        self.moderation_enabled = enabled;
        self
    }

    /// Allow or forbid anonymous posts.
    pub fn with_allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    /// Set the per-user post cap.
    pub fn with_max_posts_per_user(mut self, max: Option<u32>) -> Self {
        self.max_posts_per_user = max;
        self
    }

    /// Set the access policy.
    pub fn with_access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    /// Set the visibility, keeping the rest of the access policy.
    pub fn with_visibility(mut self, visibility: BoardVisibility) -> Self {
        self.access.visibility = visibility;
        self
    }

    /// Set the per-board-type settings.
    pub fn with_type_config(mut self, type_config: serde_json::Value) -> Self {
        self.type_config = type_config;
        self
    }

    /// Validate the new board.
    pub fn validate(&self) -> Result<()> {
        validate_settings(
            &self.title,
            &self.recipient_name,
            self.posting_mode,
            self.max_posts_per_user,
            &self.access,
        )
    }
}

/// Data for updating an existing board.
#[derive(Debug, Clone, Default)]
pub struct BoardUpdate {
    /// New title.
    pub title: Option<String>,
    /// New recipient name.
    pub recipient_name: Option<String>,
    /// New posting mode.
    pub posting_mode: Option<PostingMode>,
    /// New moderation flag.
    pub moderation_enabled: Option<bool>,
    /// New anonymous flag.
    pub allow_anonymous: Option<bool>,
    /// New post cap (`Some(None)` removes the cap).
    pub max_posts_per_user: Option<Option<u32>>,
    /// New visibility.
    pub visibility: Option<BoardVisibility>,
    /// New allowed domains.
    pub allowed_domains: Option<Vec<String>>,
    /// New blocked domains.
    pub blocked_domains: Option<Vec<String>>,
    /// New allowed emails.
    pub allowed_emails: Option<Vec<String>>,
    /// New blocked emails.
    pub blocked_emails: Option<Vec<String>>,
    /// New expiration (`Some(None)` removes it).
    pub expiration_date: Option<Option<DateTime<Utc>>>,
    /// New per-board-type settings.
    pub type_config: Option<serde_json::Value>,
}

impl BoardUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set new posting mode.
    pub fn posting_mode(mut self, mode: PostingMode) -> Self {
        self.posting_mode = Some(mode);
        self
    }

    /// Set new post cap.
    pub fn max_posts_per_user(mut self, max: Option<u32>) -> Self {
        self.max_posts_per_user = Some(max);
        self
    }

    /// Set new moderation flag.
    pub fn moderation_enabled(mut self, enabled: bool) -> Self {
        self.moderation_enabled = Some(enabled);
        self
    }

    /// Set new visibility.
    pub fn visibility(mut self, visibility: BoardVisibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Set new blocked emails.
    pub fn blocked_emails(mut self, emails: Vec<String>) -> Self {
        self.blocked_emails = Some(emails);
        self
    }

    /// Set new expiration.
    pub fn expiration_date(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.expiration_date = Some(at);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.recipient_name.is_none()
            && self.posting_mode.is_none()
            && self.moderation_enabled.is_none()
            && self.allow_anonymous.is_none()
            && self.max_posts_per_user.is_none()
            && self.visibility.is_none()
            && self.allowed_domains.is_none()
            && self.blocked_domains.is_none()
            && self.allowed_emails.is_none()
            && self.blocked_emails.is_none()
            && self.expiration_date.is_none()
            && self.type_config.is_none()
    }

    /// Return `board` with this update applied.
    pub fn apply_to(&self, board: &Board) -> Board {
        let mut merged = board.clone();
        if let Some(ref title) = self.title {
            merged.title = title.clone();
        }
        if let Some(ref name) = self.recipient_name {
            merged.recipient_name = name.clone();
        }
        if let Some(mode) = self.posting_mode {
            merged.posting_mode = mode;
        }
        if let Some(enabled) = self.moderation_enabled {
            merged.moderation_enabled = enabled;
        }
        if let Some(allow) = self.allow_anonymous {
            merged.allow_anonymous = allow;
        }
        if let Some(max) = self.max_posts_per_user {
            merged.max_posts_per_user = max;
        }
        if let Some(visibility) = self.visibility {
            merged.access.visibility = visibility;
        }
        if let Some(ref domains) = self.allowed_domains {
            merged.access = merged.access.with_allowed_domains(domains);
        }
        if let Some(ref domains) = self.blocked_domains {
            merged.access = merged.access.with_blocked_domains(domains);
        }
        if let Some(ref emails) = self.allowed_emails {
            merged.access = merged.access.with_allowed_emails(emails);
        }
        if let Some(ref emails) = self.blocked_emails {
            merged.access = merged.access.with_blocked_emails(emails);
        }
        if let Some(at) = self.expiration_date {
            merged.access.expires_at = at;
        }
        if let Some(ref config) = self.type_config {
            merged.type_config = config.clone();
        }
        merged
    }
}

/// A minimal public board for unit tests.
#[cfg(test)]
pub(crate) fn test_board(creator_id: &str) -> Board {
    let now = Utc::now();
    Board {
        id: "board-1".to_string(),
        view_token: "view-1".to_string(),
        post_token: "post-1".to_string(),
        title: "Thanks!".to_string(),
        recipient_name: "Sam".to_string(),
        creator_id: creator_id.to_string(),
        board_type: "appreciation".to_string(),
        posting_mode: PostingMode::Multiple,
        moderation_enabled: false,
        allow_anonymous: true,
        max_posts_per_user: None,
        access: AccessPolicy::public(),
        type_config: serde_json::json!({}),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ModerationStatus;

    #[test]
    fn test_new_board_defaults() {
        let board = NewBoard::new("Farewell", "Alex");

        assert_eq!(board.title, "Farewell");
        assert_eq!(board.recipient_name, "Alex");
        assert_eq!(board.posting_mode, PostingMode::Multiple);
        assert!(!board.moderation_enabled);
        assert!(board.allow_anonymous);
        assert_eq!(board.max_posts_per_user, None);
        assert_eq!(board.access.visibility, BoardVisibility::Public);
        assert!(board.validate().is_ok());
    }

    #[test]
    fn test_new_board_requires_title_and_recipient() {
        assert!(NewBoard::new("  ", "Alex").validate().is_err());
        assert!(NewBoard::new("Farewell", "").validate().is_err());
        assert!(NewBoard::new("x".repeat(MAX_TITLE_LENGTH + 1), "Alex")
            .validate()
            .is_err());
    }

    #[test]
    fn test_single_mode_cap_invariant() {
        let board = NewBoard::new("Farewell", "Alex")
            .with_posting_mode(PostingMode::Single)
            .with_max_posts_per_user(Some(2));
        assert!(matches!(board.validate(), Err(DankeError::Validation(_))));

        let board = NewBoard::new("Farewell", "Alex")
            .with_posting_mode(PostingMode::Single)
            .with_max_posts_per_user(Some(1));
        assert!(board.validate().is_ok());
    }

    #[test]
    fn test_zero_cap_rejected() {
        let board = NewBoard::new("Farewell", "Alex").with_max_posts_per_user(Some(0));
        assert!(board.validate().is_err());
    }

    #[test]
    fn test_list_validation() {
        let board = NewBoard::new("Farewell", "Alex")
            .with_access(AccessPolicy::public().with_allowed_emails(["not-an-email"]));
        assert!(board.validate().is_err());

        let board = NewBoard::new("Farewell", "Alex")
            .with_access(AccessPolicy::public().with_blocked_domains(["user@acme.com"]));
        assert!(board.validate().is_err());

        let board = NewBoard::new("Farewell", "Alex").with_access(
            AccessPolicy::public()
                .with_allowed_domains(["acme.com"])
                .with_blocked_emails(["bad@acme.com"]),
        );
        assert!(board.validate().is_ok());
    }

    #[test]
    fn test_stored_and_new_boards_share_rules() {
        let access = AccessPolicy::public().with_blocked_domains(["user@acme.com"]);
        let new_board = NewBoard::new("Farewell", "Alex").with_access(access.clone());
        let mut board = test_board("creator");
        board.access = access;

        assert!(new_board.validate().is_err());
        assert!(board.validate().is_err());

        board.access = AccessPolicy::public();
        board.posting_mode = PostingMode::Single;
        board.max_posts_per_user = Some(3);
        assert!(board.validate().is_err());
    }

    #[test]
    fn test_initial_post_status() {
        let mut board = test_board("creator");
        assert_eq!(board.initial_post_status(), ModerationStatus::Approved);
        board.moderation_enabled = true;
        assert_eq!(board.initial_post_status(), ModerationStatus::Pending);
    }

    #[test]
    fn test_board_update_apply() {
        let board = test_board("creator");
        let update = BoardUpdate::new()
            .title("New title")
            .visibility(BoardVisibility::Private)
            .blocked_emails(vec!["Bad@Example.com".to_string()])
            .max_posts_per_user(Some(3));

        assert!(!update.is_empty());
        let merged = update.apply_to(&board);
        assert_eq!(merged.title, "New title");
        assert_eq!(merged.access.visibility, BoardVisibility::Private);
        assert!(merged.access.blocked_emails.contains("bad@example.com"));
        assert_eq!(merged.max_posts_per_user, Some(3));
        assert_eq!(merged.id, board.id);
    }

    #[test]
    fn test_board_update_revalidates_single_mode() {
        let mut board = test_board("creator");
        board.max_posts_per_user = Some(3);
        let merged = BoardUpdate::new()
            .posting_mode(PostingMode::Single)
            .apply_to(&board);
        assert!(merged.validate().is_err());
    }

    #[test]
    fn test_board_update_empty() {
        assert!(BoardUpdate::new().is_empty());
        assert!(!BoardUpdate::new().expiration_date(None).is_empty());
    }
}
