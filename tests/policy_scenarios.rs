//! Policy Scenario Tests
//!
//! End-to-end scenarios for the access, posting and moderation checks,
//! driven through the public policy API without storage.

use chrono::{Duration, Utc};

use danke::board::{Board, Moderator, Post, PostingMode};
use danke::policy::{
    apply_moderation_action, evaluate_board_access, evaluate_posting_limit, is_moderator,
    require_board_creator, AccessErrorType, AccessPolicy, ModerationAction, ModerationStatus,
    Viewer,
};
use danke::DankeError;

fn board(access: AccessPolicy) -> Board {
    let now = Utc::now();
    Board {
        id: "board".to_string(),
        view_token: "view".to_string(),
        post_token: "post".to_string(),
        title: "Farewell".to_string(),
        recipient_name: "Alex".to_string(),
        creator_id: "creator".to_string(),
        board_type: "appreciation".to_string(),
        posting_mode: PostingMode::Multiple,
        moderation_enabled: true,
        allow_anonymous: true,
        max_posts_per_user: None,
        access,
        type_config: serde_json::json!({}),
        created_at: now,
        updated_at: now,
    }
}

fn post(author: &str) -> Post {
    let now = Utc::now();
    Post {
        id: "post".to_string(),
        board_id: "board".to_string(),
        creator_id: author.to_string(),
        content: "Thank you".to_string(),
        media_urls: vec![],
        is_anonymous: false,
        anonymous_name: None,
        moderation_status: ModerationStatus::Pending,
        moderation_reason: None,
        moderated_by: None,
        moderated_at: None,
        delete_scheduled_date: None,
        delete_scheduled_by: None,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

fn moderator(user_id: &str) -> Moderator {
    Moderator {
        id: format!("m-{user_id}"),
        board_id: "board".to_string(),
        user_id: user_id.to_string(),
        added_by: "creator".to_string(),
        created_at: Utc::now(),
    }
}

#[test]
fn test_block_overrides_domain_allow() {
    let policy = AccessPolicy::public()
        .with_allowed_domains(["acme.com"])
        .with_blocked_emails(["bad@acme.com"]);
    let now = Utc::now();

    let bad = evaluate_board_access(&policy, Some(&Viewer::new("1", "bad@acme.com")), now);
    assert!(!bad.has_access);
    assert_eq!(bad.error_type, Some(AccessErrorType::AccessDenied));

    let good = evaluate_board_access(&policy, Some(&Viewer::new("2", "good@acme.com")), now);
    assert!(good.has_access);

    let other = evaluate_board_access(&policy, Some(&Viewer::new("3", "x@other.com")), now);
    assert!(!other.has_access);
    assert_eq!(other.error_type, Some(AccessErrorType::AccessDenied));
}

#[test]
fn test_block_precedence_over_email_allow() {
    let policy = AccessPolicy::private()
        .with_allowed_emails(["sam@acme.com"])
        .with_blocked_emails(["sam@acme.com"]);

    let decision = evaluate_board_access(
        &policy,
        Some(&Viewer::new("sam", "sam@acme.com")),
        Utc::now(),
    );
    assert!(!decision.has_access);
}

#[test]
fn test_private_board_without_user() {
    let decision = evaluate_board_access(&AccessPolicy::private(), None, Utc::now());
    assert!(!decision.has_access);
    assert_eq!(decision.error_type, Some(AccessErrorType::NotSignedIn));
}

#[test]
fn test_expiration_checked_first() {
    let now = Utc::now();
    let policy = AccessPolicy::private().with_expiration(Some(now - Duration::minutes(1)));

    let decision = evaluate_board_access(&policy, None, now);
    assert_eq!(decision.error_type, Some(AccessErrorType::Expired));
}

#[test]
fn test_posting_cap_counts_active_posts() {
    let mut board = board(AccessPolicy::public());
    board.max_posts_per_user = Some(2);
    let viewer = Viewer::new("sam", "sam@acme.com");
    let now = Utc::now();

    assert!(!evaluate_posting_limit(&board, &viewer, 2, now).is_allowed);
    // One of the two posts was soft-deleted
    assert!(evaluate_posting_limit(&board, &viewer, 1, now).is_allowed);

    board.posting_mode = PostingMode::Single;
    board.max_posts_per_user = None;
    assert!(!evaluate_posting_limit(&board, &viewer, 1, now).is_allowed);
    assert!(evaluate_posting_limit(&board, &viewer, 0, now).is_allowed);
}

#[test]
fn test_moderator_cannot_manage_moderators() {
    let board = board(AccessPolicy::public());
    let moderators = vec![moderator("mod")];

    assert!(is_moderator(&board, &moderators, "mod"));

    // Moderator trying to manage the list hits the creator-only check
    let manage = require_board_creator(&board, "mod", "add moderators");
    assert!(
        matches!(manage, Err(DankeError::Forbidden(ref msg)) if msg == "Only board creators can add moderators")
    );

    // A stranger trying to moderate hits the moderator check
    let moderate = apply_moderation_action(
        &post("sam"),
        &board,
        &moderators,
        "stranger",
        &ModerationAction::Approve,
        Utc::now(),
    );
    match moderate {
        Err(DankeError::Forbidden(msg)) => assert!(!msg.starts_with("Only board creators")),
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[test]
fn test_schedule_deletion_in_past_fails_for_everyone() {
    let board = board(AccessPolicy::public());
    let now = Utc::now();
    let action = ModerationAction::ScheduleDeletion {
        delete_date: now,
        reason: None,
    };

    for user in ["creator", "stranger"] {
        let result = apply_moderation_action(&post("sam"), &board, &[], user, &action, now);
        assert!(matches!(result, Err(DankeError::Validation(_))));
    }
}

#[test]
fn test_delete_twice_is_a_no_op() {
    let board = board(AccessPolicy::public());
    let now = Utc::now();
    let action = ModerationAction::Delete { reason: None };
    let mut post = post("sam");

    let first = apply_moderation_action(&post, &board, &[], "creator", &action, now).unwrap();
    assert!(first.is_deleted);
    assert_eq!(first.status, ModerationStatus::Deleted);

    post.moderation_status = first.status;
    post.is_deleted = first.is_deleted;
    post.moderated_by = first.moderated_by.clone();
    post.moderated_at = first.moderated_at;

    let later = now + Duration::minutes(5);
    let second = apply_moderation_action(&post, &board, &[], "creator", &action, later).unwrap();
    assert!(second.is_unchanged(&post));
    assert_eq!(second.moderated_at, Some(now));
}
