//! Board module for Danke.
//!
//! This module provides appreciation board functionality including:
//! - Board management (create, read, update) with shareable tokens
//! - Posts with soft deletion and moderation state
//! - Moderator associations
//! - The service that runs the policy checks around every operation

mod moderator;
mod moderator_repository;
mod post;
mod post_repository;
mod repository;
mod service;
mod types;

pub use moderator::{Moderator, ModeratorWithUser};
pub use moderator_repository::ModeratorRepository;
pub use post::{
    validate_content, NewPost, Post, MAX_ANONYMOUS_NAME_LENGTH, MAX_CONTENT_LENGTH, MAX_MEDIA_URLS,
};
pub use post_repository::PostRepository;
pub use repository::BoardRepository;
pub use service::BoardService;
pub use types::{
    Board, BoardUpdate, NewBoard, MAX_LIST_ENTRIES, MAX_RECIPIENT_LENGTH, MAX_TITLE_LENGTH,
};

// Re-exported for convenience; the types live with the policy checks.
pub use crate::policy::{BoardVisibility, PostingMode};

#[cfg(test)]
pub(crate) use post::test_post;
#[cfg(test)]
pub(crate) use types::test_board;
