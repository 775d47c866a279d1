//! Moderator authorization.
//!
//! Two separate checks live here. Moderation rights (creator or listed
//! moderator) gate post moderation and reading the moderator list. Changes to
//! the moderator list are reserved to the board creator alone.

use crate::board::{Board, Moderator};
use crate::{DankeError, Result};

/// Whether `user_id` may moderate `board`.
///
/// True for the board creator and for any user with a moderator association
/// on this board. Associations for other boards are ignored.
pub fn is_moderator(board: &Board, moderators: &[Moderator], user_id: &str) -> bool {
    board.creator_id == user_id
        || moderators
            .iter()
            .any(|m| m.board_id == board.id && m.user_id == user_id)
}

/// Require moderation rights on `board`.
pub fn require_moderator(board: &Board, moderators: &[Moderator], user_id: &str) -> Result<()> {
    if is_moderator(board, moderators, user_id) {
        Ok(())
    } else {
        Err(DankeError::Forbidden(
            "You don't have permission to moderate this board".to_string(),
        ))
    }
}

/// Require that `user_id` created `board`.
///
/// `action` completes the message, e.g. "add moderators".
pub fn require_board_creator(board: &Board, user_id: &str, action: &str) -> Result<()> {
    if board.creator_id == user_id {
        Ok(())
    } else {
        Err(DankeError::Forbidden(format!(
            "Only board creators can {action}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_board;
    use chrono::Utc;

    fn moderator(board_id: &str, user_id: &str) -> Moderator {
        Moderator {
            id: format!("mod-{user_id}"),
            board_id: board_id.to_string(),
            user_id: user_id.to_string(),
            added_by: "creator".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_creator_is_moderator() {
        let board = test_board("creator");
        assert!(is_moderator(&board, &[], "creator"));
    }

    #[test]
    fn test_listed_moderator() {
        let board = test_board("creator");
        let mods = vec![moderator(&board.id, "helper")];
        assert!(is_moderator(&board, &mods, "helper"));
        assert!(!is_moderator(&board, &mods, "stranger"));
    }

    #[test]
    fn test_moderator_of_other_board_ignored() {
        let board = test_board("creator");
        let mods = vec![moderator("another-board", "helper")];
        assert!(!is_moderator(&board, &mods, "helper"));
    }

    #[test]
    fn test_require_moderator() {
        let board = test_board("creator");
        assert!(require_moderator(&board, &[], "creator").is_ok());
        assert!(matches!(
            require_moderator(&board, &[], "stranger"),
            Err(DankeError::Forbidden(_))
        ));
    }

    #[test]
    fn test_moderator_cannot_manage_moderators() {
        let board = test_board("creator");
        let mods = vec![moderator(&board.id, "helper")];

        assert!(require_moderator(&board, &mods, "helper").is_ok());
        match require_board_creator(&board, "helper", "add moderators") {
            Err(DankeError::Forbidden(msg)) => {
                assert_eq!(msg, "Only board creators can add moderators");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(require_board_creator(&board, "creator", "add moderators").is_ok());
    }
}
