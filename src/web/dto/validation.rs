//! Request body extraction and field validators for Web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidateEmail, ValidateUrl, ValidationError};

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// Malformed JSON, unknown enum values and missing fields are answered with
/// a `BAD_REQUEST` error; field rule violations with a `VALIDATION_ERROR`
/// listing each offending field. Both use the regular error envelope.
///
/// ```ignore
/// async fn create_board(
///     AuthUser(claims): AuthUser,
///     ValidatedJson(req): ValidatedJson<CreateBoardRequest>,
/// ) -> Result<(StatusCode, Json<ApiResponse<BoardResponse>>), ApiError> {
///     let board = state.service().create_board(&claims.sub, &req.into_new_board()).await?;
///     // ...
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Map a body rejection into the API error envelope.
fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("Expected a JSON body with Content-Type: application/json")
        }
        other => ApiError::bad_request(format!("Invalid JSON: {}", other.body_text())),
    }
}

// ============================================================================
// Custom Validators
// ============================================================================

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}

/// Validate that every entry of a domain list is a bare domain name.
///
/// Entries are matched against the part of an email after the `@`, so an
/// entry holding an `@` or whitespace could never match anyone.
pub fn domain_entries(values: &[String]) -> Result<(), ValidationError> {
    let is_domain = |value: &str| {
        let value = value.trim();
        value.contains('.')
            && value.split('.').all(|label| {
                !label.is_empty()
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            })
    };

    if let Some(bad) = values.iter().find(|v| !is_domain(v.as_str())) {
        let mut err = ValidationError::new("domain_entries")
            .with_message(format!("'{}' is not a domain name", bad.trim()).into());
        err.add_param("entry".into(), bad);
        return Err(err);
    }
    Ok(())
}

/// Validate that every entry of an email list is an email address.
pub fn email_entries(values: &[String]) -> Result<(), ValidationError> {
    if let Some(bad) = values.iter().find(|v| !v.trim().validate_email()) {
        let mut err = ValidationError::new("email_entries")
            .with_message(format!("'{}' is not an email address", bad.trim()).into());
        err.add_param("entry".into(), bad);
        return Err(err);
    }
    Ok(())
}

/// Validate that every attachment is an absolute http(s) URL.
pub fn http_urls(values: &[String]) -> Result<(), ValidationError> {
    let is_http = |value: &str| {
        value.validate_url() && (value.starts_with("https://") || value.starts_with("http://"))
    };

    if let Some(bad) = values.iter().find(|v| !is_http(v.as_str())) {
        let mut err = ValidationError::new("http_urls")
            .with_message("Attachments must be http or https URLs".into());
        err.add_param("entry".into(), bad);
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_no_control_chars_valid() {
        assert!(no_control_chars("Hello, world!").is_ok());
        assert!(no_control_chars("Line 1\nLine 2").is_ok());
        assert!(no_control_chars("Tab\there").is_ok());
        assert!(no_control_chars("Return\rhere").is_ok());
    }

    #[test]
    fn test_no_control_chars_invalid() {
        assert!(no_control_chars("Hello\x00World").is_err()); // NULL byte
        assert!(no_control_chars("Hello\x07World").is_err()); // Bell
        assert!(no_control_chars("Hello\x1bWorld").is_err()); // Escape
    }

    #[test]
    fn test_not_empty_trimmed_valid() {
        assert!(not_empty_trimmed("Hello").is_ok());
        assert!(not_empty_trimmed("  Hello  ").is_ok());
    }

    #[test]
    fn test_not_empty_trimmed_invalid() {
        assert!(not_empty_trimmed("").is_err());
        assert!(not_empty_trimmed("   ").is_err());
        assert!(not_empty_trimmed("\t\n").is_err());
    }

    #[test]
    fn test_domain_entries() {
        assert!(domain_entries(&[]).is_ok());
        assert!(domain_entries(&list(&["acme.com", " ACME.co.uk ", "my-team.io"])).is_ok());

        assert!(domain_entries(&list(&["acme.com", "sam@acme.com"])).is_err());
        assert!(domain_entries(&list(&["acme com"])).is_err());
        assert!(domain_entries(&list(&["acme..com"])).is_err());
        assert!(domain_entries(&list(&["-acme.com"])).is_err());
        assert!(domain_entries(&list(&["localhost"])).is_err());
        assert!(domain_entries(&list(&["   "])).is_err());
    }

    #[test]
    fn test_email_entries() {
        assert!(email_entries(&list(&["sam@acme.com", " Bad@Acme.com "])).is_ok());

        let err = email_entries(&list(&["sam@acme.com", "acme.com"])).unwrap_err();
        assert_eq!(err.code, "email_entries");
        assert!(err.message.unwrap().contains("acme.com"));
    }

    #[test]
    fn test_http_urls() {
        assert!(http_urls(&list(&["https://img.example/cake.gif", "http://a.example/x"])).is_ok());

        assert!(http_urls(&list(&["ftp://files.example/cake.gif"])).is_err());
        assert!(http_urls(&list(&["javascript:alert(1)"])).is_err());
        assert!(http_urls(&list(&["not a url"])).is_err());
    }
}
