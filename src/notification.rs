//! Notification hooks for Danke.
//!
//! Board state transitions emit a [`NotificationEvent`] through a
//! [`Notifier`]. Delivery (email, push, webhooks) is owned by whatever
//! implementation is plugged in; the board service never waits on it.

use std::sync::Mutex;

use serde::Serialize;
use tracing::info;

use crate::policy::ModerationStatus;

/// A state transition worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A post was created on a board. Sent to the board creator.
    PostCreated {
        board_id: String,
        post_id: String,
        creator_id: String,
        status: ModerationStatus,
    },
    /// A moderator changed the status of a post. Sent to the post author.
    PostModerated {
        board_id: String,
        post_id: String,
        author_id: String,
        moderator_id: String,
        status: ModerationStatus,
        reason: Option<String>,
    },
    /// A user was granted moderation rights on a board.
    ModeratorAdded {
        board_id: String,
        user_id: String,
        added_by: String,
    },
    /// A user lost moderation rights on a board.
    ModeratorRemoved {
        board_id: String,
        user_id: String,
        removed_by: String,
    },
}

impl NotificationEvent {
    /// Short event name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::PostCreated { .. } => "post_created",
            NotificationEvent::PostModerated { .. } => "post_moderated",
            NotificationEvent::ModeratorAdded { .. } => "moderator_added",
            NotificationEvent::ModeratorRemoved { .. } => "moderator_removed",
        }
    }
}

/// Receiver of notification events.
pub trait Notifier: Send + Sync {
    /// Emit an event. Must not block.
    fn notify(&self, event: &NotificationEvent);
}

/// Notifier that writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &NotificationEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => info!(kind = event.kind(), %payload, "Notification"),
            Err(_) => info!(kind = event.kind(), "Notification"),
        }
    }
}

/// Notifier that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<NotificationEvent>>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far.
    pub fn events(&self) -> Vec<NotificationEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, event: &NotificationEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
