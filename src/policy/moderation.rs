//! Post moderation state machine.
//!
//! ```text
//!            ┌──────────► approved ──────────┐
//!            │                               │
//! pending ───┼──────────► changes-requested ─┼──► deleted (terminal)
//!            │                               │
//!            └──────────► deletion-scheduled ┘
//! ```
//!
//! Every non-deleted state may move to any other non-pending state, so a
//! moderator can approve a post after requesting changes. `deleted` has no
//! outgoing transitions; deleting an already deleted post is a no-op.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::moderator::require_moderator;
use crate::board::{Board, Moderator, Post};
use crate::{DankeError, Result};

/// Maximum length for moderation reasons (in characters).
pub const MAX_REASON_LENGTH: usize = 500;

/// Default window during which authors may edit their own posts.
pub const DEFAULT_EDIT_WINDOW_MINUTES: i64 = 10;

/// Moderation state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModerationStatus {
    /// Awaiting a moderator decision.
    #[default]
    Pending,
    /// Visible to everyone who can open the board.
    Approved,
    /// The author was asked to change the post.
    ChangesRequested,
    /// The post will be deleted at its scheduled date.
    DeletionScheduled,
    /// Soft-deleted. Terminal.
    Deleted,
}

impl ModerationStatus {
    /// Convert status to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::ChangesRequested => "changes-requested",
            ModerationStatus::DeletionScheduled => "deletion-scheduled",
            ModerationStatus::Deleted => "deleted",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModerationStatus::Deleted)
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "changes-requested" => Ok(ModerationStatus::ChangesRequested),
            "deletion-scheduled" => Ok(ModerationStatus::DeletionScheduled),
            "deleted" => Ok(ModerationStatus::Deleted),
            _ => Err(format!("unknown moderation status: {s}")),
        }
    }
}

/// A moderator's decision about a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    /// Approve the post.
    Approve,
    /// Ask the author to change the post.
    RequestChange {
        /// Mandatory explanation for the author.
        reason: String,
    },
    /// Delete the post at a future date.
    ScheduleDeletion {
        /// When the post should be deleted. Must lie in the future.
        delete_date: DateTime<Utc>,
        /// Optional explanation.
        reason: Option<String>,
    },
    /// Soft-delete the post immediately.
    Delete {
        /// Optional explanation.
        reason: Option<String>,
    },
}

impl ModerationAction {
    /// Short action name used in logs and notifications.
    pub fn name(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::RequestChange { .. } => "request_change",
            ModerationAction::ScheduleDeletion { .. } => "schedule_deletion",
            ModerationAction::Delete { .. } => "delete",
        }
    }

    /// The status a post ends up in after this action.
    pub fn target_status(&self) -> ModerationStatus {
        match self {
            ModerationAction::Approve => ModerationStatus::Approved,
            ModerationAction::RequestChange { .. } => ModerationStatus::ChangesRequested,
            ModerationAction::ScheduleDeletion { .. } => ModerationStatus::DeletionScheduled,
            ModerationAction::Delete { .. } => ModerationStatus::Deleted,
        }
    }

    /// Validate the action's parameters against `now`.
    ///
    /// Independent of who performs the action.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        match self {
            ModerationAction::Approve => Ok(()),
            ModerationAction::RequestChange { reason } => {
                if reason.trim().is_empty() {
                    return Err(DankeError::Validation(
                        "A reason is required when requesting changes".to_string(),
                    ));
                }
                validate_reason_length(reason)
            }
            ModerationAction::ScheduleDeletion {
                delete_date,
                reason,
            } => {
                if *delete_date <= now {
                    return Err(DankeError::Validation(
                        "Delete date must be in the future".to_string(),
                    ));
                }
                reason.as_deref().map_or(Ok(()), validate_reason_length)
            }
            ModerationAction::Delete { reason } => {
                reason.as_deref().map_or(Ok(()), validate_reason_length)
            }
        }
    }

    fn reason(&self) -> Option<String> {
        let reason = match self {
            ModerationAction::Approve => None,
            ModerationAction::RequestChange { reason } => Some(reason.as_str()),
            ModerationAction::ScheduleDeletion { reason, .. }
            | ModerationAction::Delete { reason } => reason.as_deref(),
        };
        reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }
}

fn validate_reason_length(reason: &str) -> Result<()> {
    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(DankeError::Validation(format!(
            "Reason must be at most {MAX_REASON_LENGTH} characters"
        )));
    }
    Ok(())
}

/// The moderation fields of a post after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationUpdate {
    /// New moderation status.
    pub status: ModerationStatus,
    /// Reason recorded with the decision.
    pub reason: Option<String>,
    /// Moderator who made the decision.
    pub moderated_by: Option<String>,
    /// When the decision was made.
    pub moderated_at: Option<DateTime<Utc>>,
    /// Scheduled deletion date.
    pub delete_scheduled_date: Option<DateTime<Utc>>,
    /// Moderator who scheduled the deletion.
    pub delete_scheduled_by: Option<String>,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

impl ModerationUpdate {
    /// The moderation fields currently stored on `post`.
    pub fn from_post(post: &Post) -> Self {
        Self {
            status: post.moderation_status,
            reason: post.moderation_reason.clone(),
            moderated_by: post.moderated_by.clone(),
            moderated_at: post.moderated_at,
            delete_scheduled_date: post.delete_scheduled_date,
            delete_scheduled_by: post.delete_scheduled_by.clone(),
            is_deleted: post.is_deleted,
        }
    }

    /// Whether applying this update would leave `post` unchanged.
    pub fn is_unchanged(&self, post: &Post) -> bool {
        *self == Self::from_post(post)
    }
}

/// Apply a moderation action to `post`.
///
/// Checks run in this order: action parameters, post/board consistency,
/// moderator authorization, then the transition itself. Returns the fields
/// to persist; the caller performs the write atomically.
pub fn apply_moderation_action(
    post: &Post,
    board: &Board,
    moderators: &[Moderator],
    moderator_id: &str,
    action: &ModerationAction,
    now: DateTime<Utc>,
) -> Result<ModerationUpdate> {
    action.validate(now)?;

    if post.board_id != board.id {
        return Err(DankeError::Validation(
            "Post does not belong to this board".to_string(),
        ));
    }

    require_moderator(board, moderators, moderator_id)?;

    if post.is_deleted || post.moderation_status.is_terminal() {
        return match action {
            ModerationAction::Delete { .. } => Ok(ModerationUpdate::from_post(post)),
            _ => Err(DankeError::Validation(
                "Post has been deleted and can no longer be moderated".to_string(),
            )),
        };
    }

    let mut update = ModerationUpdate {
        status: action.target_status(),
        reason: action.reason(),
        moderated_by: Some(moderator_id.to_string()),
        moderated_at: Some(now),
        delete_scheduled_date: None,
        delete_scheduled_by: None,
        is_deleted: false,
    };

    match action {
        ModerationAction::ScheduleDeletion { delete_date, .. } => {
            update.delete_scheduled_date = Some(*delete_date);
            update.delete_scheduled_by = Some(moderator_id.to_string());
        }
        ModerationAction::Delete { .. } => {
            // Keep the schedule as history of how the post got here.
            update.delete_scheduled_date = post.delete_scheduled_date;
            update.delete_scheduled_by = post.delete_scheduled_by.clone();
            update.is_deleted = true;
        }
        ModerationAction::Approve | ModerationAction::RequestChange { .. } => {}
    }

    Ok(update)
}

/// Check that `user_id` may still edit the content of `post`.
///
/// Only the author may edit, and only within `window` of creation. Editing
/// never touches the moderation status.
pub fn check_edit_window(
    post: &Post,
    user_id: &str,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<()> {
    if post.is_deleted {
        return Err(DankeError::NotFound("post".to_string()));
    }
    if post.creator_id != user_id {
        return Err(DankeError::Forbidden(
            "You can only edit your own posts".to_string(),
        ));
    }
    if now - post.created_at > window {
        return Err(DankeError::Forbidden(format!(
            "Posts can only be edited within {} minutes of creation",
            window.num_minutes()
        )));
    }
    Ok(())
}
