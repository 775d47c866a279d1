//! Board access evaluation.
//!
//! Visibility, expiration and the email/domain allow and block lists are
//! combined into a single [`AccessDecision`]. Checks run in a fixed order and
//! the first failing check wins:
//!
//! 1. expiration
//! 2. sign-in (private boards only)
//! 3. blocked emails
//! 4. allowed emails
//! 5. blocked domains
//! 6. allowed domains
//!
//! Block lists are consulted before allow lists, so an address that appears
//! on both is rejected.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may open a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardVisibility {
    /// Anyone with the link, signed in or not.
    #[default]
    Public,
    /// Signed-in users only.
    Private,
}

impl BoardVisibility {
    /// Convert visibility to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardVisibility::Public => "public",
            BoardVisibility::Private => "private",
        }
    }
}

impl fmt::Display for BoardVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BoardVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(BoardVisibility::Public),
            "private" => Ok(BoardVisibility::Private),
            _ => Err(format!("unknown board visibility: {s}")),
        }
    }
}

/// Classification of a negative access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessErrorType {
    /// A private board was opened without a signed-in user.
    NotSignedIn,
    /// The viewer is excluded by an allow or block list.
    AccessDenied,
    /// The board's expiration date has passed.
    Expired,
}

/// Result of evaluating board access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// Whether the viewer may open the board.
    pub has_access: bool,
    /// Human-readable reason when access is refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Classification when access is refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<AccessErrorType>,
}

impl AccessDecision {
    /// Access granted.
    pub fn granted() -> Self {
        Self {
            has_access: true,
            reason: None,
            error_type: None,
        }
    }

    /// Access refused with the given classification and reason.
    pub fn denied(error_type: AccessErrorType, reason: impl Into<String>) -> Self {
        Self {
            has_access: false,
            reason: Some(reason.into()),
            error_type: Some(error_type),
        }
    }
}

/// An already-authenticated user as seen by the policy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// User ID from the identity provider.
    pub id: String,
    /// Primary email address.
    pub email: String,
}

impl Viewer {
    /// Create a new viewer.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }

    /// Normalized email used for list comparisons.
    pub fn normalized_email(&self) -> String {
        normalize(&self.email)
    }

    /// The part of the email after the last `@`, normalized.
    ///
    /// Returns an empty string when the email has no `@`.
    pub fn email_domain(&self) -> String {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| normalize(domain))
            .unwrap_or_default()
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalize_set<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| normalize(v.as_ref()))
        .filter(|v| !v.is_empty())
        .collect()
}

/// Typed access configuration of a board.
///
/// Built once per board fetch; list entries are trimmed, lowercased and
/// de-duplicated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessPolicy {
    /// Board visibility.
    pub visibility: BoardVisibility,
    /// If non-empty, only these email domains may access the board.
    pub allowed_domains: BTreeSet<String>,
    /// Email domains that may never access the board.
    pub blocked_domains: BTreeSet<String>,
    /// If non-empty, only these email addresses may access the board.
    pub allowed_emails: BTreeSet<String>,
    /// Email addresses that may never access the board.
    pub blocked_emails: BTreeSet<String>,
    /// Moment after which the board is no longer accessible.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessPolicy {
    /// A public policy without lists or expiration.
    pub fn public() -> Self {
        Self::default()
    }

    /// A private policy without lists or expiration.
    pub fn private() -> Self {
        Self {
            visibility: BoardVisibility::Private,
            ..Self::default()
        }
    }

    /// Replace the allowed domains.
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_domains = normalize_set(domains);
        self
    }

    /// Replace the blocked domains.
    pub fn with_blocked_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked_domains = normalize_set(domains);
        self
    }

    /// Replace the allowed emails.
    pub fn with_allowed_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_emails = normalize_set(emails);
        self
    }

    /// Replace the blocked emails.
    pub fn with_blocked_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked_emails = normalize_set(emails);
        self
    }

    /// Set the expiration moment.
    pub fn with_expiration(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Whether the board has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    /// Whether any allow or block list is configured.
    pub fn has_lists(&self) -> bool {
        !(self.allowed_domains.is_empty()
            && self.blocked_domains.is_empty()
            && self.allowed_emails.is_empty()
            && self.blocked_emails.is_empty())
    }

    /// Check the allow and block lists for a signed-in viewer.
    fn check_lists(&self, viewer: &Viewer) -> Option<AccessDecision> {
        let email = viewer.normalized_email();
        let domain = viewer.email_domain();

        if self.blocked_emails.contains(&email) {
            return Some(AccessDecision::denied(
                AccessErrorType::AccessDenied,
                "Your email address has been blocked from this board",
            ));
        }
        if !self.allowed_emails.is_empty() && !self.allowed_emails.contains(&email) {
            return Some(AccessDecision::denied(
                AccessErrorType::AccessDenied,
                "Your email address is not on this board's allow list",
            ));
        }
        if self.blocked_domains.contains(&domain) {
            return Some(AccessDecision::denied(
                AccessErrorType::AccessDenied,
                "Your email domain has been blocked from this board",
            ));
        }
        if !self.allowed_domains.is_empty() && !self.allowed_domains.contains(&domain) {
            return Some(AccessDecision::denied(
                AccessErrorType::AccessDenied,
                "Your email domain is not allowed on this board",
            ));
        }
        None
    }
}

/// Decide whether `viewer` may open a board governed by `policy` at `now`.
///
/// `viewer` is `None` for visitors who are not signed in. Never fails; every
/// outcome is expressed in the returned decision.
pub fn evaluate_board_access(
    policy: &AccessPolicy,
    viewer: Option<&Viewer>,
    now: DateTime<Utc>,
) -> AccessDecision {
    if policy.is_expired(now) {
        return AccessDecision::denied(AccessErrorType::Expired, "Board has expired");
    }

    let viewer = match (policy.visibility, viewer) {
        (BoardVisibility::Private, None) => {
            return AccessDecision::denied(
                AccessErrorType::NotSignedIn,
                "Please sign in to view this board",
            );
        }
        // Lists cannot apply to an anonymous visitor of a public board.
        (BoardVisibility::Public, None) => return AccessDecision::granted(),
        (_, Some(viewer)) => viewer,
    };
    if !policy.has_lists() {
        return AccessDecision::granted();
    }

    policy
        .check_lists(viewer)
        .unwrap_or_else(AccessDecision::granted)
}
