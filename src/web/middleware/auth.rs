//! JWT identity middleware.
//!
//! Session tokens are issued by the external identity provider and signed
//! with a shared HS256 secret. This module only verifies them and turns the
//! claims into a [`Viewer`] for the policy checks.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::UserProfile;
use crate::policy::Viewer;
use crate::web::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID at the identity provider).
    pub sub: String,
    /// Primary email address.
    pub email: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
}

impl JwtClaims {
    /// Claims valid for `ttl_secs` from now.
    pub fn new(sub: impl Into<String>, email: impl Into<String>, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: sub.into(),
            email: email.into(),
            name: None,
            picture: None,
            iat: now.max(0) as u64,
            exp: (now + ttl_secs).max(0) as u64,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The identity as seen by the policy checks.
    pub fn viewer(&self) -> Viewer {
        Viewer::new(&self.sub, &self.email)
    }

    /// The identity to mirror into the local user table.
    ///
    /// Falls back to the local part of the email when no name is given.
    pub fn profile(&self) -> UserProfile {
        let name = self
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });
        UserProfile {
            id: self.sub.clone(),
            name,
            email: self.email.clone(),
            avatar_url: self.picture.clone(),
        }
    }
}

/// Application state for JWT authentication.
#[derive(Clone)]
pub struct JwtState {
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Validation settings.
    pub validation: Validation,
}

impl JwtState {
    /// Create a new JWT state from a secret key.
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key,
            validation,
        }
    }

    fn verify(&self, token: &str) -> Option<JwtClaims> {
        match decode::<JwtClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("JWT validation failed: {}", e);
                None
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extractor for authenticated users.
///
/// Rejects the request with 401 when no valid token is present.
#[derive(Debug, Clone)]
pub struct AuthUser(pub JwtClaims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = bearer_token(parts)
                .ok_or_else(|| ApiError::not_signed_in("Please sign in to continue"))?;

            let jwt_state = parts
                .extensions
                .get::<Arc<JwtState>>()
                .ok_or_else(|| ApiError::internal("JWT state not configured"))?;

            let claims = jwt_state
                .verify(token)
                .ok_or_else(|| ApiError::not_signed_in("Invalid or expired session"))?;

            Ok(AuthUser(claims))
        })
    }
}

/// Optional authentication extractor.
///
/// Anonymous visitors and invalid tokens both yield `None`.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<JwtClaims>);

impl OptionalAuthUser {
    /// The visitor as seen by the policy checks.
    pub fn viewer(&self) -> Option<Viewer> {
        self.0.as_ref().map(JwtClaims::viewer)
    }
}

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let Some(token) = bearer_token(parts) else {
                return Ok(OptionalAuthUser(None));
            };
            let claims = parts
                .extensions
                .get::<Arc<JwtState>>()
                .and_then(|state| state.verify(token));
            Ok(OptionalAuthUser(claims))
        })
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(
    jwt_state: Arc<JwtState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn create_test_token(secret: &str, claims: &JwtClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_verify_token() {
        let secret = "test-secret";
        let state = JwtState::new(secret);
        let claims = JwtClaims::new("user_1", "sam@acme.com", 3600).with_name("Sam");

        let token = create_test_token(secret, &claims);
        let decoded = state.verify(&token).unwrap();

        assert_eq!(decoded.sub, "user_1");
        assert_eq!(decoded.email, "sam@acme.com");
        assert_eq!(decoded.name.as_deref(), Some("Sam"));
    }

    #[test]
    fn test_expired_token() {
        let secret = "test-secret";
        let state = JwtState::new(secret);
        let claims = JwtClaims::new("user_1", "sam@acme.com", -3600);

        let token = create_test_token(secret, &claims);
        assert!(state.verify(&token).is_none());
    }

    #[test]
    fn test_invalid_secret() {
        let claims = JwtClaims::new("user_1", "sam@acme.com", 3600);
        let token = create_test_token("secret1", &claims);
        assert!(JwtState::new("secret2").verify(&token).is_none());
    }

    #[test]
    fn test_claims_to_viewer_and_profile() {
        let claims = JwtClaims::new("user_1", "Sam@Acme.com", 3600);
        let viewer = claims.viewer();
        assert_eq!(viewer.id, "user_1");
        assert_eq!(viewer.email_domain(), "acme.com");

        let profile = claims.profile();
        assert_eq!(profile.name, "Sam");
        assert_eq!(profile.email, "Sam@Acme.com");
    }
}
