//! Posting limit evaluation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::access::{evaluate_board_access, Viewer};
use crate::board::Board;

/// How many posts a single user may leave on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingMode {
    /// One post per user.
    Single,
    /// Any number of posts, optionally capped by `max_posts_per_user`.
    #[default]
    Multiple,
}

impl PostingMode {
    /// Convert posting mode to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingMode::Single => "single",
            PostingMode::Multiple => "multiple",
        }
    }
}

impl fmt::Display for PostingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PostingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(PostingMode::Single),
            "multiple" => Ok(PostingMode::Multiple),
            _ => Err(format!("unknown posting mode: {s}")),
        }
    }
}

/// Result of evaluating whether a user may create another post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingDecision {
    /// Whether another post may be created.
    pub is_allowed: bool,
    /// Reason when posting is refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The user's existing non-deleted posts on the board.
    pub post_count: u32,
}

impl PostingDecision {
    fn allowed(post_count: u32) -> Self {
        Self {
            is_allowed: true,
            reason: None,
            post_count,
        }
    }

    fn refused(reason: impl Into<String>, post_count: u32) -> Self {
        Self {
            is_allowed: false,
            reason: Some(reason.into()),
            post_count,
        }
    }
}

/// Decide whether `viewer` may create another post on `board`.
///
/// `existing_post_count` must only include the viewer's non-deleted posts,
/// so a soft-deleted post frees its slot. Posts scheduled for deletion still
/// count.
///
/// The stored `max_posts_per_user` is trusted as-is; the single-mode cap is
/// validated when the board is written, not here.
pub fn evaluate_posting_limit(
    board: &Board,
    viewer: &Viewer,
    existing_post_count: u32,
    now: DateTime<Utc>,
) -> PostingDecision {
    let access = evaluate_board_access(&board.access, Some(viewer), now);
    if !access.has_access {
        let reason = access
            .reason
            .unwrap_or_else(|| "You cannot post on this board".to_string());
        return PostingDecision::refused(reason, existing_post_count);
    }

    match (board.posting_mode, board.max_posts_per_user) {
        (PostingMode::Single, _) => {
            if existing_post_count == 0 {
                PostingDecision::allowed(existing_post_count)
            } else {
                PostingDecision::refused(
                    "This board only allows one post per person",
                    existing_post_count,
                )
            }
        }
        (PostingMode::Multiple, Some(max)) => {
            if existing_post_count < max {
                PostingDecision::allowed(existing_post_count)
            } else {
                PostingDecision::refused(
                    format!("You have reached the limit of {max} posts on this board"),
                    existing_post_count,
                )
            }
        }
        (PostingMode::Multiple, None) => PostingDecision::allowed(existing_post_count),
    }
}
