//! Database schema and migrations for Danke.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users mirrored from the identity provider
    r#"
-- Users are owned by the external identity provider; this is a local copy
-- used for email lookups and display names.
CREATE TABLE users (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    avatar_url  TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX idx_users_email ON users(email COLLATE NOCASE);
"#,
    // v2: Boards
    r#"
CREATE TABLE boards (
    id                  TEXT PRIMARY KEY,
    view_token          TEXT NOT NULL UNIQUE,
    post_token          TEXT NOT NULL UNIQUE,
    title               TEXT NOT NULL,
    recipient_name      TEXT NOT NULL,
    creator_id          TEXT NOT NULL,
    board_type          TEXT NOT NULL DEFAULT 'appreciation',
    posting_mode        TEXT NOT NULL DEFAULT 'multiple',   -- 'single' or 'multiple'
    moderation_enabled  INTEGER NOT NULL DEFAULT 0,
    allow_anonymous     INTEGER NOT NULL DEFAULT 1,
    max_posts_per_user  TEXT,                               -- positive integer as text
    board_visibility    TEXT NOT NULL DEFAULT 'public',     -- 'public' or 'private'
    allowed_domains     TEXT NOT NULL DEFAULT '[]',         -- JSON array
    blocked_domains     TEXT NOT NULL DEFAULT '[]',
    allowed_emails      TEXT NOT NULL DEFAULT '[]',
    blocked_emails      TEXT NOT NULL DEFAULT '[]',
    expiration_date     TEXT,
    type_config         TEXT NOT NULL DEFAULT '{}',
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE INDEX idx_boards_creator_id ON boards(creator_id);
"#,
    // v3: Posts
    r#"
CREATE TABLE posts (
    id                      TEXT PRIMARY KEY,
    board_id                TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    creator_id              TEXT NOT NULL,
    content                 TEXT NOT NULL,
    media_urls              TEXT NOT NULL DEFAULT '[]',     -- JSON array
    is_anonymous            INTEGER NOT NULL DEFAULT 0,
    anonymous_name          TEXT,
    moderation_status       TEXT NOT NULL DEFAULT 'pending',
    moderation_reason       TEXT,
    moderated_by            TEXT,
    moderated_at            TEXT,
    delete_scheduled_date   TEXT,
    delete_scheduled_by     TEXT,
    is_deleted              INTEGER NOT NULL DEFAULT 0,
    created_at              TEXT NOT NULL,
    updated_at              TEXT NOT NULL
);

CREATE INDEX idx_posts_board_id ON posts(board_id);
CREATE INDEX idx_posts_board_creator ON posts(board_id, creator_id);
CREATE INDEX idx_posts_moderation_status ON posts(moderation_status);
"#,
    // v4: Board moderators
    r#"
CREATE TABLE board_moderators (
    id          TEXT PRIMARY KEY,
    board_id    TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    user_id     TEXT NOT NULL,
    added_by    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE(board_id, user_id)
);

CREATE INDEX idx_board_moderators_user_id ON board_moderators(user_id);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_migrations_are_valid_sql() {
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(migration.contains("CREATE TABLE") || migration.contains("ALTER TABLE"));
        }
    }

    #[test]
    fn test_boards_migration_contains_policy_columns() {
        let boards = MIGRATIONS[1];
        assert!(boards.contains("CREATE TABLE boards"));
        for column in [
            "posting_mode",
            "max_posts_per_user",
            "board_visibility",
            "allowed_domains",
            "blocked_emails",
            "expiration_date",
        ] {
            assert!(boards.contains(column), "missing {column}");
        }
    }

    #[test]
    fn test_posts_migration_contains_moderation_columns() {
        let posts = MIGRATIONS[2];
        assert!(posts.contains("CREATE TABLE posts"));
        assert!(posts.contains("moderation_status"));
        assert!(posts.contains("delete_scheduled_date"));
        assert!(posts.contains("is_deleted"));
    }

    #[test]
    fn test_moderators_unique_per_board() {
        assert!(MIGRATIONS[3].contains("UNIQUE(board_id, user_id)"));
    }
}
