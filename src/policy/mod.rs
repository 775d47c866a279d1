//! Board access and moderation policy for Danke.
//!
//! Everything in this module is a synchronous, side-effect-free function of
//! data the caller has already loaded:
//! - Board access evaluation (expiration, visibility, allow/block lists)
//! - Posting limits (single/multiple mode, per-user caps)
//! - Moderator authorization (creator or listed moderator)
//! - The post moderation state machine and the author edit window

mod access;
mod limit;
mod moderation;
mod moderator;

pub use access::{
    evaluate_board_access, AccessDecision, AccessErrorType, AccessPolicy, BoardVisibility,
    Viewer,
};
pub use limit::{evaluate_posting_limit, PostingDecision, PostingMode};
pub use moderation::{
    apply_moderation_action, check_edit_window, ModerationAction, ModerationStatus,
    ModerationUpdate, DEFAULT_EDIT_WINDOW_MINUTES, MAX_REASON_LENGTH,
};
pub use moderator::{is_moderator, require_board_creator, require_moderator};
