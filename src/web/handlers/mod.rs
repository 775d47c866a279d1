//! API handlers for the Danke web API.

pub mod board;
pub mod config;
pub mod moderator;
pub mod post;

pub use board::*;
pub use config::*;
pub use moderator::*;
pub use post::*;

use std::sync::Arc;

use chrono::Duration;

use crate::board::BoardService;
use crate::config::FeaturesConfig;
use crate::db::{Database, User, UserRepository};
use crate::notification::{LogNotifier, Notifier};
use crate::policy::DEFAULT_EDIT_WINDOW_MINUTES;
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle; clones share the pool.
    pub db: Database,
    /// Receiver of post and moderator events.
    pub notifier: Arc<dyn Notifier>,
    /// How long authors may edit their posts.
    pub edit_window: Duration,
    /// Feature flags exposed to clients.
    pub features: FeaturesConfig,
}

impl AppState {
    /// Create a new application state with log notifications.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            notifier: Arc::new(LogNotifier),
            edit_window: Duration::minutes(DEFAULT_EDIT_WINDOW_MINUTES),
            features: FeaturesConfig::default(),
        }
    }

    /// Set the notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Set the edit window.
    pub fn with_edit_window(mut self, window: Duration) -> Self {
        self.edit_window = window;
        self
    }

    /// Set the feature flags.
    pub fn with_features(mut self, features: FeaturesConfig) -> Self {
        self.features = features;
        self
    }

    /// Board service bound to this state.
    pub fn service(&self) -> BoardService<'_> {
        BoardService::new(&self.db)
            .with_notifier(self.notifier.as_ref())
            .with_edit_window(self.edit_window)
    }

    /// Mirror the signed-in identity into the local user table.
    pub async fn sync_user(&self, claims: &JwtClaims) -> Result<User, ApiError> {
        UserRepository::new(self.db.pool())
            .upsert(&claims.profile())
            .await
            .map_err(|e| {
                tracing::error!("Failed to sync user {}: {}", claims.sub, e);
                ApiError::internal("Failed to load user")
            })
    }
}
