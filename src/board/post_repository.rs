//! Post repository for Danke.
//!
//! This module provides CRUD operations for posts in the database.
//! Soft-deleted posts are excluded from every read except [`fetch_post`].
//!
//! The connection-level functions are used by the board service inside
//! transactions; the repository methods wrap them for plain pool access.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::warn;

use super::post::Post;
use crate::db::DbPool;
use crate::policy::{ModerationStatus, ModerationUpdate};
use crate::{DankeError, Result};

const POST_COLUMNS: &str = "id, board_id, creator_id, content, media_urls, is_anonymous,
    anonymous_name, moderation_status, moderation_reason, moderated_by, moderated_at,
    delete_scheduled_date, delete_scheduled_by, is_deleted, created_at, updated_at";

/// Repository for post CRUD operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new PostRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a fully built post.
    #[cfg(test)]
    pub async fn create(&self, post: &Post) -> Result<Post> {
        let mut conn = self.pool.acquire().await?;
        insert_post(&mut conn, post).await?;
        fetch_post(&mut conn, &post.id)
            .await?
            .ok_or_else(|| DankeError::NotFound("post".to_string()))
    }

    /// Get a post by ID, including soft-deleted posts.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Post>> {
        let mut conn = self.pool.acquire().await?;
        fetch_post(&mut conn, id).await
    }

    /// List all non-deleted posts of a board, oldest first.
    pub async fn list_by_board(&self, board_id: &str) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE board_id = ? AND is_deleted = 0
             ORDER BY created_at ASC, rowid ASC"
        );
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(board_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(PostRow::into_post).collect())
    }

    /// Count a user's non-deleted posts on a board.
    pub async fn count_active_by_creator(&self, board_id: &str, creator_id: &str) -> Result<u32> {
        let mut conn = self.pool.acquire().await?;
        count_active_by_creator(&mut conn, board_id, creator_id).await
    }

    /// Replace the content of a post.
    ///
    /// Returns the updated post, or None if not found.
    pub async fn update_content(
        &self,
        id: &str,
        content: &str,
        media_urls: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>> {
        let mut conn = self.pool.acquire().await?;
        let result = match media_urls {
            Some(urls) => {
                sqlx::query(
                    "UPDATE posts SET content = ?, media_urls = ?, updated_at = ?
                     WHERE id = ? AND is_deleted = 0",
                )
                .bind(content)
                .bind(encode_urls(urls)?)
                .bind(now)
                .bind(id)
                .execute(&mut *conn)
                .await?
            }
            None => {
                sqlx::query(
                    "UPDATE posts SET content = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
                )
                .bind(content)
                .bind(now)
                .bind(id)
                .execute(&mut *conn)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        fetch_post(&mut conn, id).await
    }

    /// List posts whose scheduled deletion date has passed.
    pub async fn list_due_for_deletion(&self, now: DateTime<Utc>) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE moderation_status = ? AND is_deleted = 0
               AND delete_scheduled_date IS NOT NULL"
        );
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(ModerationStatus::DeletionScheduled.as_str())
            .fetch_all(self.pool)
            .await?;
        // Stored timestamps are compared as dates, not as text.
        Ok(rows
            .into_iter()
            .map(PostRow::into_post)
            .filter(|p| p.delete_scheduled_date.is_some_and(|at| at <= now))
            .collect())
    }
}

/// Fetch a post by ID on an open connection or transaction.
pub(crate) async fn fetch_post(conn: &mut SqliteConnection, id: &str) -> Result<Option<Post>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?");
    let row: Option<PostRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(PostRow::into_post))
}

/// Insert a post on an open connection or transaction.
pub(crate) async fn insert_post(conn: &mut SqliteConnection, post: &Post) -> Result<()> {
    sqlx::query(
        "INSERT INTO posts (id, board_id, creator_id, content, media_urls, is_anonymous,
            anonymous_name, moderation_status, moderation_reason, moderated_by, moderated_at,
            delete_scheduled_date, delete_scheduled_by, is_deleted, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.id)
    .bind(&post.board_id)
    .bind(&post.creator_id)
    .bind(&post.content)
    .bind(encode_urls(&post.media_urls)?)
    .bind(post.is_anonymous)
    .bind(&post.anonymous_name)
    .bind(post.moderation_status.as_str())
    .bind(&post.moderation_reason)
    .bind(&post.moderated_by)
    .bind(post.moderated_at)
    .bind(post.delete_scheduled_date)
    .bind(&post.delete_scheduled_by)
    .bind(post.is_deleted)
    .bind(post.created_at)
    .bind(post.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Count a user's non-deleted posts on a board on an open connection.
pub(crate) async fn count_active_by_creator(
    conn: &mut SqliteConnection,
    board_id: &str,
    creator_id: &str,
) -> Result<u32> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM posts WHERE board_id = ? AND creator_id = ? AND is_deleted = 0",
    )
    .bind(board_id)
    .bind(creator_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Write the moderation fields of a post on an open connection.
///
/// Returns false if the post does not exist.
pub(crate) async fn write_moderation(
    conn: &mut SqliteConnection,
    id: &str,
    update: &ModerationUpdate,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE posts SET
            moderation_status = ?, moderation_reason = ?, moderated_by = ?, moderated_at = ?,
            delete_scheduled_date = ?, delete_scheduled_by = ?, is_deleted = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(update.status.as_str())
    .bind(&update.reason)
    .bind(&update.moderated_by)
    .bind(update.moderated_at)
    .bind(update.delete_scheduled_date)
    .bind(&update.delete_scheduled_by)
    .bind(update.is_deleted)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

fn encode_urls(urls: &[String]) -> Result<String> {
    serde_json::to_string(urls).map_err(|e| DankeError::Database(e.to_string()))
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: String,
    board_id: String,
    creator_id: String,
    content: String,
    media_urls: String,
    is_anonymous: bool,
    anonymous_name: Option<String>,
    moderation_status: String,
    moderation_reason: Option<String>,
    moderated_by: Option<String>,
    moderated_at: Option<DateTime<Utc>>,
    delete_scheduled_date: Option<DateTime<Utc>>,
    delete_scheduled_by: Option<String>,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> Post {
        let media_urls = serde_json::from_str(&self.media_urls).unwrap_or_else(|e| {
            warn!(post_id = %self.id, error = %e, "Ignoring malformed media URLs");
            Vec::new()
        });
        let moderation_status = self.moderation_status.parse().unwrap_or_else(|e| {
            warn!(post_id = %self.id, error = %e, "Falling back to pending status");
            ModerationStatus::Pending
        });
        Post {
            id: self.id,
            board_id: self.board_id,
            creator_id: self.creator_id,
            content: self.content,
            media_urls,
            is_anonymous: self.is_anonymous,
            anonymous_name: self.anonymous_name,
            moderation_status,
            moderation_reason: self.moderation_reason,
            moderated_by: self.moderated_by,
            moderated_at: self.moderated_at,
            delete_scheduled_date: self.delete_scheduled_date,
            delete_scheduled_by: self.delete_scheduled_by,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
