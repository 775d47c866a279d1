//! User repository for Danke.
//!
//! This module keeps the local user mirror in sync with the identity provider.

use chrono::Utc;

use super::user::{User, UserProfile};
use super::DbPool;
use crate::{DankeError, Result};

/// Repository for mirrored users.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh a user from identity provider data.
    pub async fn upsert(&self, profile: &UserProfile) -> Result<User> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (id, name, email, avatar_url, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at",
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(profile.email.trim())
        .bind(&profile.avatar_url)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        self.get_by_id(&profile.id)
            .await?
            .ok_or_else(|| DankeError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, avatar_url, created_at, updated_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, avatar_url, created_at, updated_at
             FROM users WHERE email = ? COLLATE NOCASE
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(email.trim())
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }
}
