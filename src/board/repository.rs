//! Board repository for Danke.
//!
//! This module provides CRUD operations for boards in the database. List
//! settings are stored as JSON text and the per-user cap as text, so rows
//! are decoded through [`BoardRow`] before reaching the policy engine.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::types::Board;
use crate::db::DbPool;
use crate::policy::{AccessPolicy, BoardVisibility, PostingMode};
use crate::{DankeError, Result};

const BOARD_COLUMNS: &str = "id, view_token, post_token, title, recipient_name, creator_id,
    board_type, posting_mode, moderation_enabled, allow_anonymous, max_posts_per_user,
    board_visibility, allowed_domains, blocked_domains, allowed_emails, blocked_emails,
    expiration_date, type_config, created_at, updated_at";

/// Repository for board CRUD operations.
pub struct BoardRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BoardRepository<'a> {
    /// Create a new BoardRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a fully built board.
    ///
    /// Returns the board as read back from the database.
    pub async fn create(&self, board: &Board) -> Result<Board> {
        sqlx::query(
            "INSERT INTO boards (id, view_token, post_token, title, recipient_name, creator_id,
                board_type, posting_mode, moderation_enabled, allow_anonymous, max_posts_per_user,
                board_visibility, allowed_domains, blocked_domains, allowed_emails, blocked_emails,
                expiration_date, type_config, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&board.id)
        .bind(&board.view_token)
        .bind(&board.post_token)
        .bind(&board.title)
        .bind(&board.recipient_name)
        .bind(&board.creator_id)
        .bind(&board.board_type)
        .bind(board.posting_mode.as_str())
        .bind(board.moderation_enabled)
        .bind(board.allow_anonymous)
        .bind(board.max_posts_per_user.map(|m| m.to_string()))
        .bind(board.access.visibility.as_str())
        .bind(encode_list(board.access.allowed_domains.iter())?)
        .bind(encode_list(board.access.blocked_domains.iter())?)
        .bind(encode_list(board.access.allowed_emails.iter())?)
        .bind(encode_list(board.access.blocked_emails.iter())?)
        .bind(board.access.expires_at)
        .bind(board.type_config.to_string())
        .bind(board.created_at)
        .bind(board.updated_at)
        .execute(self.pool)
        .await?;

        self.get_by_id(&board.id)
            .await?
            .ok_or_else(|| DankeError::NotFound("board".to_string()))
    }

    /// Get a board by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Board>> {
        self.fetch_one_by("id", id).await
    }

    /// Get a board by its view token.
    pub async fn get_by_view_token(&self, token: &str) -> Result<Option<Board>> {
        self.fetch_one_by("view_token", token).await
    }

    /// Get a board by its post token.
    pub async fn get_by_post_token(&self, token: &str) -> Result<Option<Board>> {
        self.fetch_one_by("post_token", token).await
    }

    async fn fetch_one_by(&self, column: &'static str, value: &str) -> Result<Option<Board>> {
        let sql = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE {column} = ?");
        let row: Option<BoardRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(BoardRow::into_board))
    }

    /// List boards created by a user, newest first.
    pub async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Board>> {
        let sql = format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE creator_id = ? ORDER BY created_at DESC, rowid DESC"
        );
        let rows: Vec<BoardRow> = sqlx::query_as(&sql)
            .bind(creator_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(BoardRow::into_board).collect())
    }

    /// Persist every mutable setting of a board.
    ///
    /// Identity fields (ID, tokens, creator, creation time) are never changed.
    /// Returns the stored board, or None if not found.
    pub async fn save(&self, board: &Board) -> Result<Option<Board>> {
        let result = sqlx::query(
            "UPDATE boards SET
                title = ?, recipient_name = ?, board_type = ?, posting_mode = ?,
                moderation_enabled = ?, allow_anonymous = ?, max_posts_per_user = ?,
                board_visibility = ?, allowed_domains = ?, blocked_domains = ?,
                allowed_emails = ?, blocked_emails = ?, expiration_date = ?,
                type_config = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&board.title)
        .bind(&board.recipient_name)
        .bind(&board.board_type)
        .bind(board.posting_mode.as_str())
        .bind(board.moderation_enabled)
        .bind(board.allow_anonymous)
        .bind(board.max_posts_per_user.map(|m| m.to_string()))
        .bind(board.access.visibility.as_str())
        .bind(encode_list(board.access.allowed_domains.iter())?)
        .bind(encode_list(board.access.blocked_domains.iter())?)
        .bind(encode_list(board.access.allowed_emails.iter())?)
        .bind(encode_list(board.access.blocked_emails.iter())?)
        .bind(board.access.expires_at)
        .bind(board.type_config.to_string())
        .bind(board.updated_at)
        .bind(&board.id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(&board.id).await
    }
}

fn encode_list<'s>(items: impl Iterator<Item = &'s String>) -> Result<String> {
    let items: Vec<&String> = items.collect();
    serde_json::to_string(&items).map_err(|e| DankeError::Database(e.to_string()))
}

fn decode_list(board_id: &str, column: &str, raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(board_id, column, error = %e, "Ignoring malformed list setting");
            Vec::new()
        }
    }
}

/// Parse the stored per-user cap. Anything that is not a positive integer
/// is treated as "no cap".
fn decode_max_posts(board_id: &str, raw: Option<&str>) -> Option<u32> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => {
            warn!(board_id, value = raw, "Ignoring invalid max_posts_per_user");
            None
        }
        Ok(max) => Some(max),
    }
}

#[derive(sqlx::FromRow)]
struct BoardRow {
    id: String,
    view_token: String,
    post_token: String,
    title: String,
    recipient_name: String,
    creator_id: String,
    board_type: String,
    posting_mode: String,
    moderation_enabled: bool,
    allow_anonymous: bool,
    max_posts_per_user: Option<String>,
    board_visibility: String,
    allowed_domains: String,
    blocked_domains: String,
    allowed_emails: String,
    blocked_emails: String,
    expiration_date: Option<DateTime<Utc>>,
    type_config: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BoardRow {
    fn into_board(self) -> Board {
        let posting_mode: PostingMode = self.posting_mode.parse().unwrap_or_else(|e| {
            warn!(board_id = %self.id, error = %e, "Falling back to multiple posting mode");
            PostingMode::Multiple
        });
        let visibility: BoardVisibility = self.board_visibility.parse().unwrap_or_else(|e| {
            warn!(board_id = %self.id, error = %e, "Falling back to private visibility");
            BoardVisibility::Private
        });
        let max_posts_per_user = decode_max_posts(&self.id, self.max_posts_per_user.as_deref());
        if posting_mode == PostingMode::Single && max_posts_per_user.is_some_and(|m| m > 1) {
            warn!(
                board_id = %self.id,
                max_posts_per_user = ?max_posts_per_user,
                "Single posting mode board carries a cap above one"
            );
        }

        let mut access = match visibility {
            BoardVisibility::Public => AccessPolicy::public(),
            BoardVisibility::Private => AccessPolicy::private(),
        };
        access = access
            .with_allowed_domains(decode_list(&self.id, "allowed_domains", &self.allowed_domains))
            .with_blocked_domains(decode_list(&self.id, "blocked_domains", &self.blocked_domains))
            .with_allowed_emails(decode_list(&self.id, "allowed_emails", &self.allowed_emails))
            .with_blocked_emails(decode_list(&self.id, "blocked_emails", &self.blocked_emails))
            .with_expiration(self.expiration_date);

        let type_config = serde_json::from_str(&self.type_config).unwrap_or_else(|e| {
            warn!(board_id = %self.id, error = %e, "Ignoring malformed type config");
            serde_json::Value::Object(Default::default())
        });

        Board {
            id: self.id,
            view_token: self.view_token,
            post_token: self.post_token,
            title: self.title,
            recipient_name: self.recipient_name,
            creator_id: self.creator_id,
            board_type: self.board_type,
            posting_mode,
            moderation_enabled: self.moderation_enabled,
            allow_anonymous: self.allow_anonymous,
            max_posts_per_user,
            access,
            type_config,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
