//! Error types for Danke.

use thiserror::Error;

use crate::policy::{AccessDecision, AccessErrorType};

/// Common error type for Danke.
#[derive(Error, Debug)]
pub enum DankeError {
    /// The board requires a signed-in user and none was provided.
    #[error("not signed in: {0}")]
    NotSignedIn(String),

    /// Visibility or allow/block list violation.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The board has passed its expiration date.
    #[error("expired: {0}")]
    Expired(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Authorization failure for a moderation or management action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Validation error for caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource already exists (e.g. a duplicate moderator).
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// A user tried to reference themselves where that is not allowed.
    #[error("self reference: {0}")]
    SelfReference(String),

    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DankeError {
    /// Convert a negative access decision into the matching error.
    ///
    /// Returns `None` when the decision grants access.
    pub fn from_decision(decision: &AccessDecision) -> Option<Self> {
        if decision.has_access {
            return None;
        }
        let reason = decision
            .reason
            .clone()
            .unwrap_or_else(|| "access denied".to_string());
        let err = match decision.error_type {
            Some(AccessErrorType::NotSignedIn) => DankeError::NotSignedIn(reason),
            Some(AccessErrorType::Expired) => DankeError::Expired(reason),
            Some(AccessErrorType::AccessDenied) | None => DankeError::AccessDenied(reason),
        };
        Some(err)
    }
}

impl From<sqlx::Error> for DankeError {
    fn from(e: sqlx::Error) -> Self {
        DankeError::Database(e.to_string())
    }
}

/// Result type alias for Danke operations.
pub type Result<T> = std::result::Result<T, DankeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_error_display() {
        let err = DankeError::Forbidden("Only board creators can add moderators".to_string());
        assert_eq!(
            err.to_string(),
            "forbidden: Only board creators can add moderators"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = DankeError::Validation("reason is required".to_string());
        assert_eq!(err.to_string(), "validation error: reason is required");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = DankeError::NotFound("post".to_string());
        assert_eq!(err.to_string(), "post not found");
    }

    #[test]
    fn test_already_exists_display() {
        let err = DankeError::AlreadyExists("moderator".to_string());
        assert_eq!(err.to_string(), "moderator already exists");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DankeError = io_err.into();
        assert!(matches!(err, DankeError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_decision_granted() {
        assert!(DankeError::from_decision(&AccessDecision::granted()).is_none());
    }

    #[test]
    fn test_from_decision_maps_error_type() {
        let decision = AccessDecision::denied(AccessErrorType::Expired, "Board has expired");
        assert!(matches!(
            DankeError::from_decision(&decision),
            Some(DankeError::Expired(_))
        ));

        let decision = AccessDecision::denied(AccessErrorType::NotSignedIn, "sign in");
        assert!(matches!(
            DankeError::from_decision(&decision),
            Some(DankeError::NotSignedIn(_))
        ));

        let decision = AccessDecision::denied(AccessErrorType::AccessDenied, "blocked");
        match DankeError::from_decision(&decision) {
            Some(DankeError::AccessDenied(msg)) => assert_eq!(msg, "blocked"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
