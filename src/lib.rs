//! Danke - shareable appreciation boards
//!
//! Boards collect messages for a recipient. Who may open a board, who may
//! post on it and how posts move through moderation is decided by the pure
//! checks in [`policy`]; [`board::BoardService`] loads the records, runs the
//! checks and persists the outcome; [`web`] exposes it over HTTP.

pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod notification;
pub mod policy;
pub mod web;

pub use board::{Board, BoardService, Moderator, NewBoard, NewPost, Post};
pub use config::Config;
pub use db::{Database, User, UserRepository};
pub use error::{DankeError, Result};
pub use notification::{LogNotifier, MemoryNotifier, NotificationEvent, Notifier};
pub use policy::{AccessDecision, AccessPolicy, ModerationAction, ModerationStatus, Viewer};
