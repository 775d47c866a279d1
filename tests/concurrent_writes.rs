//! Concurrent Write Tests
//!
//! Races posting and moderation against a file-backed database with a
//! multi-connection pool, where writers really do contend for the lock.

use tokio::task::JoinSet;

use danke::board::{NewBoard, NewPost, PostingMode};
use danke::db::UserProfile;
use danke::{BoardService, Database, DankeError, ModerationAction, ModerationStatus, UserRepository, Viewer};

async fn setup_file_db(dir: &tempfile::TempDir) -> Database {
    let db = Database::open(dir.path().join("danke.db")).await.unwrap();
    let users = UserRepository::new(db.pool());
    for (id, email) in [
        ("creator", "creator@acme.com"),
        ("mod", "mod@acme.com"),
        ("author", "author@acme.com"),
    ] {
        users
            .upsert(&UserProfile::new(id, id, email))
            .await
            .unwrap();
    }
    db
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_posts_on_single_mode_board() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir).await;
    let board = BoardService::new(&db)
        .create_board(
            "creator",
            &NewBoard::new("Farewell", "Alex").with_posting_mode(PostingMode::Single),
        )
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let db = db.clone();
        let board_id = board.id.clone();
        tasks.spawn(async move {
            BoardService::new(&db)
                .create_post(
                    &board_id,
                    &Viewer::new("author", "author@acme.com"),
                    &NewPost::new(format!("Thanks #{i}")),
                )
                .await
        });
    }

    let mut created = 0;
    let mut forbidden = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => created += 1,
            Err(DankeError::Forbidden(_)) => forbidden += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(forbidden, 7);

    let posts = BoardService::new(&db)
        .list_posts(&board.id, Some(&Viewer::new("author", "author@acme.com")))
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_moderation_is_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir).await;
    let service = BoardService::new(&db);
    let board = service
        .create_board("creator", &NewBoard::new("Farewell", "Alex").with_moderation(true))
        .await
        .unwrap();
    service
        .add_moderator(&board.id, "creator", "mod@acme.com")
        .await
        .unwrap();
    let post = service
        .create_post(
            &board.id,
            &Viewer::new("author", "author@acme.com"),
            &NewPost::new("Thanks!"),
        )
        .await
        .unwrap();

    for round in 0..20 {
        let mut tasks = JoinSet::new();
        for i in 0..4 {
            let db = db.clone();
            let post_id = post.id.clone();
            let moderator = if i % 2 == 0 { "mod" } else { "creator" };
            let action = if (round + i) % 2 == 0 {
                ModerationAction::Approve
            } else {
                ModerationAction::RequestChange {
                    reason: format!("Round {round}"),
                }
            };
            tasks.spawn(async move {
                BoardService::new(&db)
                    .moderate_post(&post_id, moderator, &action)
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            let updated = result.unwrap().unwrap();
            assert!(matches!(
                updated.moderation_status,
                ModerationStatus::Approved | ModerationStatus::ChangesRequested
            ));
        }
    }

    let stored = service.get_post(&post.id).await.unwrap();
    assert!(!stored.is_deleted);
    assert!(stored.moderated_by.is_some());
}
