//! Moderator repository for Danke.

use chrono::{DateTime, Utc};

use super::moderator::{Moderator, ModeratorWithUser};
use crate::db::DbPool;
use crate::{DankeError, Result};

/// Repository for board moderator associations.
pub struct ModeratorRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ModeratorRepository<'a> {
    /// Create a new ModeratorRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Grant moderation rights on a board.
    ///
    /// Returns `AlreadyExists` if the user already moderates the board.
    pub async fn create(
        &self,
        id: &str,
        board_id: &str,
        user_id: &str,
        added_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Moderator> {
        let result = sqlx::query(
            "INSERT INTO board_moderators (id, board_id, user_id, added_by, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(board_id, user_id) DO NOTHING",
        )
        .bind(id)
        .bind(board_id)
        .bind(user_id)
        .bind(added_by)
        .bind(now)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DankeError::AlreadyExists("moderator".to_string()));
        }

        self.get(board_id, user_id)
            .await?
            .ok_or_else(|| DankeError::NotFound("moderator".to_string()))
    }

    /// Get the association of a user with a board.
    pub async fn get(&self, board_id: &str, user_id: &str) -> Result<Option<Moderator>> {
        let moderator = sqlx::query_as::<_, Moderator>(
            "SELECT id, board_id, user_id, added_by, created_at
             FROM board_moderators WHERE board_id = ? AND user_id = ?",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(moderator)
    }

    /// List the moderators of a board, oldest first.
    pub async fn list_by_board(&self, board_id: &str) -> Result<Vec<Moderator>> {
        let moderators = sqlx::query_as::<_, Moderator>(
            "SELECT id, board_id, user_id, added_by, created_at
             FROM board_moderators WHERE board_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(board_id)
        .fetch_all(self.pool)
        .await?;
        Ok(moderators)
    }

    /// List the moderators of a board joined with their user profiles.
    ///
    /// Moderators whose user is missing from the mirror are shown with an
    /// empty name and email.
    pub async fn list_with_users(&self, board_id: &str) -> Result<Vec<ModeratorWithUser>> {
        let moderators = sqlx::query_as::<_, ModeratorWithUser>(
            "SELECT m.id, m.user_id,
                    COALESCE(u.name, '') AS name,
                    COALESCE(u.email, '') AS email,
                    u.avatar_url, m.added_by, m.created_at
             FROM board_moderators m
             LEFT JOIN users u ON u.id = m.user_id
             WHERE m.board_id = ?
             ORDER BY m.created_at ASC, m.rowid ASC",
        )
        .bind(board_id)
        .fetch_all(self.pool)
        .await?;
        Ok(moderators)
    }

    /// Revoke moderation rights.
    ///
    /// Returns true if an association was removed.
    pub async fn delete(&self, board_id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM board_moderators WHERE board_id = ? AND user_id = ?")
            .bind(board_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{test_board, BoardRepository};
    use crate::db::{UserProfile, UserRepository};
    use crate::Database;

    async fn setup_db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        BoardRepository::new(db.pool())
            .create(&test_board("creator"))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup_db().await;
        let repo = ModeratorRepository::new(db.pool());

        let moderator = repo
            .create("m1", "board-1", "mod", "creator", Utc::now())
            .await
            .unwrap();
        assert_eq!(moderator.user_id, "mod");
        assert_eq!(moderator.added_by, "creator");
        let stored = repo.get("board-1", "mod").await.unwrap().unwrap();
        assert_eq!(stored.id, "m1");
        assert!(repo.get("board-1", "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let db = setup_db().await;
        let repo = ModeratorRepository::new(db.pool());

        repo.create("m1", "board-1", "mod", "creator", Utc::now())
            .await
            .unwrap();
        let result = repo
            .create("m2", "board-1", "mod", "creator", Utc::now())
            .await;
        assert!(matches!(result, Err(DankeError::AlreadyExists(_))));
        assert_eq!(repo.list_by_board("board-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_with_users() {
        let db = setup_db().await;
        UserRepository::new(db.pool())
            .upsert(&UserProfile::new("mod", "Mo", "mo@example.com"))
            .await
            .unwrap();
        let repo = ModeratorRepository::new(db.pool());
        repo.create("m1", "board-1", "mod", "creator", Utc::now())
            .await
            .unwrap();
        repo.create("m2", "board-1", "ghost", "creator", Utc::now())
            .await
            .unwrap();

        let moderators = repo.list_with_users("board-1").await.unwrap();
        assert_eq!(moderators.len(), 2);
        assert_eq!(moderators[0].name, "Mo");
        assert_eq!(moderators[0].email, "mo@example.com");
        assert_eq!(moderators[1].name, "");
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup_db().await;
        let repo = ModeratorRepository::new(db.pool());
        repo.create("m1", "board-1", "mod", "creator", Utc::now())
            .await
            .unwrap();

        assert!(repo.delete("board-1", "mod").await.unwrap());
        assert!(!repo.delete("board-1", "mod").await.unwrap());
        assert!(repo.get("board-1", "mod").await.unwrap().is_none());
    }
}
