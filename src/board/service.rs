//! Board service for Danke.
//!
//! This module provides the high-level board, post and moderator operations.
//! It fetches records, hands them to the pure checks in [`crate::policy`]
//! and persists the outcome. Post creation and moderation transitions run as
//! read-modify-write inside a transaction.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{Database, UserRepository};
use crate::notification::{LogNotifier, NotificationEvent, Notifier};
use crate::policy::{
    apply_moderation_action, check_edit_window, evaluate_board_access, evaluate_posting_limit,
    is_moderator, require_board_creator, require_moderator, AccessDecision, ModerationAction,
    ModerationStatus, ModerationUpdate, PostingDecision, Viewer, DEFAULT_EDIT_WINDOW_MINUTES,
};
use crate::{DankeError, Result};

use super::moderator::{Moderator, ModeratorWithUser};
use super::moderator_repository::ModeratorRepository;
use super::post::{validate_content, NewPost, Post, MAX_MEDIA_URLS};
use super::post_repository::{self, PostRepository};
use super::repository::BoardRepository;
use super::types::{Board, BoardUpdate, NewBoard};

static LOG_NOTIFIER: LogNotifier = LogNotifier;

/// Service for board operations with policy checking.
pub struct BoardService<'a> {
    db: &'a Database,
    notifier: &'a dyn Notifier,
    edit_window: Duration,
    fixed_now: Option<DateTime<Utc>>,
}

impl<'a> BoardService<'a> {
    /// Create a new BoardService with the given database reference.
    ///
    /// Notifications go to the log until another notifier is set.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            notifier: &LOG_NOTIFIER,
            edit_window: Duration::minutes(DEFAULT_EDIT_WINDOW_MINUTES),
            fixed_now: None,
        }
    }

    /// Send notifications to `notifier`.
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Set how long authors may edit their posts.
    pub fn with_edit_window(mut self, window: Duration) -> Self {
        self.edit_window = window;
        self
    }

    /// Evaluate every check at `now` instead of the current time.
    pub fn with_fixed_time(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    // ---------------------------------------------------------------------
    // Boards
    // ---------------------------------------------------------------------

    /// Create a board owned by `creator_id`.
    ///
    /// View and post tokens are generated here.
    pub async fn create_board(&self, creator_id: &str, new_board: &NewBoard) -> Result<Board> {
        new_board.validate()?;

        let now = self.now();
        let board = Board {
            id: Uuid::new_v4().to_string(),
            view_token: Uuid::new_v4().to_string(),
            post_token: Uuid::new_v4().to_string(),
            title: new_board.title.trim().to_string(),
            recipient_name: new_board.recipient_name.trim().to_string(),
            creator_id: creator_id.to_string(),
            board_type: new_board.board_type.clone(),
            posting_mode: new_board.posting_mode,
            moderation_enabled: new_board.moderation_enabled,
            allow_anonymous: new_board.allow_anonymous,
            max_posts_per_user: new_board.max_posts_per_user,
            access: new_board.access.clone(),
            type_config: new_board.type_config.clone(),
            created_at: now,
            updated_at: now,
        };

        let board = BoardRepository::new(self.db.pool()).create(&board).await?;
        info!(board_id = %board.id, creator_id, "Board created");
        Ok(board)
    }

    /// Update the settings of a board. Creator only.
    ///
    /// The merged board is validated as a whole, so an update cannot break
    /// the single-mode cap by changing only one of the two fields.
    pub async fn update_board(
        &self,
        board_id: &str,
        actor_id: &str,
        update: &BoardUpdate,
    ) -> Result<Board> {
        let board = self.get_board(board_id).await?;
        require_board_creator(&board, actor_id, "update board settings")?;

        if update.is_empty() {
            return Ok(board);
        }

        let mut merged = update.apply_to(&board);
        merged.validate()?;
        merged.updated_at = self.now();

        let board = BoardRepository::new(self.db.pool())
            .save(&merged)
            .await?
            .ok_or_else(|| DankeError::NotFound("board".to_string()))?;
        info!(board_id, actor_id, "Board updated");
        Ok(board)
    }

    /// Get a board by ID without any access check.
    pub async fn get_board(&self, board_id: &str) -> Result<Board> {
        BoardRepository::new(self.db.pool())
            .get_by_id(board_id)
            .await?
            .ok_or_else(|| DankeError::NotFound("board".to_string()))
    }

    /// Get a board by its view token without any access check.
    pub async fn get_board_by_view_token(&self, token: &str) -> Result<Board> {
        BoardRepository::new(self.db.pool())
            .get_by_view_token(token)
            .await?
            .ok_or_else(|| DankeError::NotFound("board".to_string()))
    }

    /// Get a board by its post token without any access check.
    pub async fn get_board_by_post_token(&self, token: &str) -> Result<Board> {
        BoardRepository::new(self.db.pool())
            .get_by_post_token(token)
            .await?
            .ok_or_else(|| DankeError::NotFound("board".to_string()))
    }

    /// List the boards created by a user.
    pub async fn list_boards_by_creator(&self, creator_id: &str) -> Result<Vec<Board>> {
        BoardRepository::new(self.db.pool())
            .list_by_creator(creator_id)
            .await
    }

    /// Evaluate whether `viewer` may open a board.
    pub async fn check_board_access(
        &self,
        board_id: &str,
        viewer: Option<&Viewer>,
    ) -> Result<AccessDecision> {
        let board = self.get_board(board_id).await?;
        Ok(evaluate_board_access(&board.access, viewer, self.now()))
    }

    /// Open a board, failing with the access error when denied.
    pub async fn view_board(&self, board_id: &str, viewer: Option<&Viewer>) -> Result<Board> {
        let board = self.get_board(board_id).await?;
        self.ensure_access(board, viewer)
    }

    /// Open a board through its view token, failing with the access error
    /// when denied.
    pub async fn view_board_by_token(&self, token: &str, viewer: Option<&Viewer>) -> Result<Board> {
        let board = self.get_board_by_view_token(token).await?;
        self.ensure_access(board, viewer)
    }

    /// Open a board through its post token, failing with the access error
    /// when denied.
    pub async fn view_board_by_post_token(
        &self,
        token: &str,
        viewer: Option<&Viewer>,
    ) -> Result<Board> {
        let board = self.get_board_by_post_token(token).await?;
        self.ensure_access(board, viewer)
    }

    fn ensure_access(&self, board: Board, viewer: Option<&Viewer>) -> Result<Board> {
        let decision = evaluate_board_access(&board.access, viewer, self.now());
        match DankeError::from_decision(&decision) {
            Some(err) => {
                debug!(
                    board_id = %board.id,
                    viewer = viewer.map(|v| v.id.as_str()),
                    error_type = ?decision.error_type,
                    "Board access denied"
                );
                Err(err)
            }
            None => Ok(board),
        }
    }

    // ---------------------------------------------------------------------
    // Posts
    // ---------------------------------------------------------------------

    /// Evaluate whether `viewer` may create another post on a board.
    pub async fn check_posting_limits(
        &self,
        board_id: &str,
        viewer: &Viewer,
    ) -> Result<PostingDecision> {
        let board = self.get_board(board_id).await?;
        let count = PostRepository::new(self.db.pool())
            .count_active_by_creator(board_id, &viewer.id)
            .await?;
        Ok(evaluate_posting_limit(&board, viewer, count, self.now()))
    }

    /// Create a post on a board.
    ///
    /// The post starts out pending on moderated boards and approved
    /// otherwise. The post count and the insert share one transaction.
    pub async fn create_post(
        &self,
        board_id: &str,
        viewer: &Viewer,
        new_post: &NewPost,
    ) -> Result<Post> {
        let now = self.now();
        let board = self.view_board(board_id, Some(viewer)).await?;

        if new_post.is_anonymous && !board.allow_anonymous {
            return Err(DankeError::Validation(
                "Anonymous posts are not allowed on this board".to_string(),
            ));
        }
        new_post.validate()?;

        let anonymous_name = if new_post.is_anonymous {
            new_post
                .anonymous_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        let post = Post {
            id: Uuid::new_v4().to_string(),
            board_id: board.id.clone(),
            creator_id: viewer.id.clone(),
            content: new_post.content.clone(),
            media_urls: new_post.media_urls.clone(),
            is_anonymous: new_post.is_anonymous,
            anonymous_name,
            moderation_status: board.initial_post_status(),
            moderation_reason: None,
            moderated_by: None,
            moderated_at: None,
            delete_scheduled_date: None,
            delete_scheduled_by: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin_immediate().await?;
        let count =
            post_repository::count_active_by_creator(&mut tx, &board.id, &viewer.id).await?;
        let decision = evaluate_posting_limit(&board, viewer, count, now);
        if !decision.is_allowed {
            tx.rollback().await?;
            let reason = decision
                .reason
                .unwrap_or_else(|| "You cannot post on this board".to_string());
            debug!(board_id, user_id = %viewer.id, count, "Posting limit reached");
            return Err(DankeError::Forbidden(reason));
        }
        post_repository::insert_post(&mut tx, &post).await?;
        tx.commit().await?;

        info!(
            board_id,
            post_id = %post.id,
            status = %post.moderation_status,
            "Post created"
        );
        self.notifier.notify(&NotificationEvent::PostCreated {
            board_id: board.id.clone(),
            post_id: post.id.clone(),
            creator_id: board.creator_id.clone(),
            status: post.moderation_status,
        });
        Ok(post)
    }

    /// Create a post on the board a post token points at.
    ///
    /// The token only locates the board; access, anonymity and posting
    /// limits apply exactly as in [`BoardService::create_post`].
    pub async fn create_post_by_token(
        &self,
        token: &str,
        viewer: &Viewer,
        new_post: &NewPost,
    ) -> Result<Post> {
        let board = self.get_board_by_post_token(token).await?;
        self.create_post(&board.id, viewer, new_post).await
    }

    /// Get a post by ID, including soft-deleted posts.
    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        PostRepository::new(self.db.pool())
            .get_by_id(post_id)
            .await?
            .ok_or_else(|| DankeError::NotFound("post".to_string()))
    }

    /// List the posts of a board visible to `viewer`.
    ///
    /// Moderators see every non-deleted post. Everyone else sees approved
    /// posts plus their own.
    pub async fn list_posts(&self, board_id: &str, viewer: Option<&Viewer>) -> Result<Vec<Post>> {
        let board = self.view_board(board_id, viewer).await?;
        let posts = PostRepository::new(self.db.pool());

        let posts = posts.list_by_board(&board.id).await?;

        if let Some(viewer) = viewer {
            let moderators = ModeratorRepository::new(self.db.pool())
                .list_by_board(&board.id)
                .await?;
            if is_moderator(&board, &moderators, &viewer.id) {
                return Ok(posts);
            }
        }
        let viewer_id = viewer.map(|v| v.id.as_str());
        Ok(posts
            .into_iter()
            .filter(|p| p.is_visible_to(viewer_id))
            .collect())
    }

    /// Edit the content of a post. Author only, within the edit window.
    ///
    /// `media_urls` replaces the attachments when given. The moderation
    /// status is left as it is.
    pub async fn edit_post(
        &self,
        post_id: &str,
        user_id: &str,
        content: &str,
        media_urls: Option<&[String]>,
    ) -> Result<Post> {
        let now = self.now();
        let post = self.get_post(post_id).await?;
        check_edit_window(&post, user_id, self.edit_window, now)?;

        validate_content(content)?;
        if let Some(urls) = media_urls {
            if urls.len() > MAX_MEDIA_URLS {
                return Err(DankeError::Validation(format!(
                    "A post may have at most {MAX_MEDIA_URLS} attachments"
                )));
            }
        }

        let post = PostRepository::new(self.db.pool())
            .update_content(post_id, content, media_urls, now)
            .await?
            .ok_or_else(|| DankeError::NotFound("post".to_string()))?;
        debug!(post_id, user_id, "Post edited");
        Ok(post)
    }

    // ---------------------------------------------------------------------
    // Moderators
    // ---------------------------------------------------------------------

    /// Whether `user_id` may moderate a board.
    pub async fn has_moderator_permissions(&self, board_id: &str, user_id: &str) -> Result<bool> {
        let board = self.get_board(board_id).await?;
        let moderators = ModeratorRepository::new(self.db.pool())
            .list_by_board(board_id)
            .await?;
        Ok(is_moderator(&board, &moderators, user_id))
    }

    /// List the moderators of a board. Moderators only.
    pub async fn list_moderators(
        &self,
        board_id: &str,
        actor_id: &str,
    ) -> Result<Vec<ModeratorWithUser>> {
        let board = self.get_board(board_id).await?;
        let repo = ModeratorRepository::new(self.db.pool());
        let moderators = repo.list_by_board(board_id).await?;
        require_moderator(&board, &moderators, actor_id)?;
        repo.list_with_users(board_id).await
    }

    /// Grant moderation rights to the user registered under `email`.
    /// Creator only.
    pub async fn add_moderator(&self, board_id: &str, actor_id: &str, email: &str) -> Result<Moderator> {
        let board = self.get_board(board_id).await?;
        require_board_creator(&board, actor_id, "add moderators")?;

        let user = UserRepository::new(self.db.pool())
            .get_by_email(email)
            .await?
            .ok_or_else(|| DankeError::NotFound("user".to_string()))?;
        if user.id == board.creator_id {
            return Err(DankeError::SelfReference(
                "The board creator already has moderator rights".to_string(),
            ));
        }

        let moderator = ModeratorRepository::new(self.db.pool())
            .create(
                &Uuid::new_v4().to_string(),
                board_id,
                &user.id,
                actor_id,
                self.now(),
            )
            .await?;

        info!(board_id, user_id = %user.id, added_by = actor_id, "Moderator added");
        self.notifier.notify(&NotificationEvent::ModeratorAdded {
            board_id: board_id.to_string(),
            user_id: user.id,
            added_by: actor_id.to_string(),
        });
        Ok(moderator)
    }

    /// Revoke the moderation rights of `user_id`. Creator only.
    pub async fn remove_moderator(&self, board_id: &str, actor_id: &str, user_id: &str) -> Result<()> {
        let board = self.get_board(board_id).await?;
        require_board_creator(&board, actor_id, "remove moderators")?;

        let removed = ModeratorRepository::new(self.db.pool())
            .delete(board_id, user_id)
            .await?;
        if !removed {
            return Err(DankeError::NotFound("moderator".to_string()));
        }

        info!(board_id, user_id, removed_by = actor_id, "Moderator removed");
        self.notifier.notify(&NotificationEvent::ModeratorRemoved {
            board_id: board_id.to_string(),
            user_id: user_id.to_string(),
            removed_by: actor_id.to_string(),
        });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Moderation
    // ---------------------------------------------------------------------

    /// Apply a moderation action to a post.
    ///
    /// Action parameters are checked first, then the post lookup, then
    /// moderator authorization. The transition itself is recomputed on the
    /// post as read inside the write transaction. Deleting a deleted post
    /// returns it unchanged and emits nothing.
    pub async fn moderate_post(
        &self,
        post_id: &str,
        moderator_id: &str,
        action: &ModerationAction,
    ) -> Result<Post> {
        let now = self.now();
        action.validate(now)?;

        let post = self.get_post(post_id).await?;
        let board = self.get_board(&post.board_id).await?;
        let moderators = ModeratorRepository::new(self.db.pool())
            .list_by_board(&board.id)
            .await?;
        apply_moderation_action(&post, &board, &moderators, moderator_id, action, now)?;

        let mut tx = self.db.begin_immediate().await?;
        let current = post_repository::fetch_post(&mut tx, post_id)
            .await?
            .ok_or_else(|| DankeError::NotFound("post".to_string()))?;
        let update = apply_moderation_action(&current, &board, &moderators, moderator_id, action, now)?;

        if update.is_unchanged(&current) {
            tx.rollback().await?;
            debug!(post_id, action = action.name(), "Moderation action was a no-op");
            return Ok(current);
        }

        post_repository::write_moderation(&mut tx, post_id, &update, now).await?;
        let updated = post_repository::fetch_post(&mut tx, post_id)
            .await?
            .ok_or_else(|| DankeError::NotFound("post".to_string()))?;
        tx.commit().await?;

        info!(
            post_id,
            board_id = %board.id,
            moderator_id,
            action = action.name(),
            from = %current.moderation_status,
            to = %updated.moderation_status,
            "Post moderated"
        );
        self.notifier.notify(&NotificationEvent::PostModerated {
            board_id: board.id.clone(),
            post_id: updated.id.clone(),
            author_id: updated.creator_id.clone(),
            moderator_id: moderator_id.to_string(),
            status: updated.moderation_status,
            reason: updated.moderation_reason.clone(),
        });
        Ok(updated)
    }

    /// Soft-delete every post whose scheduled deletion date is at or before
    /// `now`.
    ///
    /// Returns the number of posts deleted.
    pub async fn apply_scheduled_deletions(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = PostRepository::new(self.db.pool())
            .list_due_for_deletion(now)
            .await?;

        let mut deleted = 0;
        for candidate in due {
            let mut tx = self.db.begin_immediate().await?;
            let Some(post) = post_repository::fetch_post(&mut tx, &candidate.id).await? else {
                tx.rollback().await?;
                continue;
            };
            let still_due = !post.is_deleted
                && post.moderation_status == ModerationStatus::DeletionScheduled
                && post.delete_scheduled_date.is_some_and(|at| at <= now);
            if !still_due {
                tx.rollback().await?;
                continue;
            }

            let update = ModerationUpdate {
                status: ModerationStatus::Deleted,
                is_deleted: true,
                ..ModerationUpdate::from_post(&post)
            };
            if !post_repository::write_moderation(&mut tx, &post.id, &update, now).await? {
                warn!(post_id = %post.id, "Scheduled post vanished before deletion");
                tx.rollback().await?;
                continue;
            }
            tx.commit().await?;
            deleted += 1;

            self.notifier.notify(&NotificationEvent::PostModerated {
                board_id: post.board_id.clone(),
                post_id: post.id.clone(),
                author_id: post.creator_id.clone(),
                moderator_id: post.delete_scheduled_by.clone().unwrap_or_default(),
                status: ModerationStatus::Deleted,
                reason: post.moderation_reason.clone(),
            });
        }

        if deleted > 0 {
            info!(deleted, "Applied scheduled post deletions");
        }
        Ok(deleted)
    }
}
