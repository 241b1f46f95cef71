//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used by every HTTP handler.
//! Each variant maps to one stable status code and a short, client-safe message.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can return it
//! directly. `From` implementations for the component errors (`TokenError`,
//! `RepositoryError`, `HashError`, `validator::ValidationErrors`) allow easy
//! conversion using the `?` operator.
//!
//! Details of unexpected failures are written to the server log and never echoed
//! to the client.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::password::HashError;
use crate::auth::token::TokenError;
use crate::repository::RepositoryError;

/// Message sent to clients for every internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Represents all possible errors that can reach an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Missing or invalid input fields (HTTP 400).
    BadRequest(String),
    /// Missing, invalid or expired credentials (HTTP 401).
    Unauthorized(String),
    /// Authenticated, but not permitted to act on the resource (HTTP 403).
    Forbidden(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// A unique key is already taken (HTTP 409).
    Conflict(String),
    /// An unexpected failure in a collaborator (HTTP 500).
    /// The message is logged, the client only sees `INTERNAL_ERROR_MESSAGE`.
    InternalServerError(String),
}

impl AppError {
    /// The message that is safe to show to the client.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg,
            AppError::InternalServerError(_) => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects with a
/// `{"message": ...}` JSON body.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::InternalServerError(detail) = self {
            log::error!("internal error: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.public_message()
        }))
    }
}

/// Message sent when a validation failure carries no message of its own.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid request body";

/// Picks the declared message of the first failing field (by field name).
///
/// Rejected values are never included.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .flat_map(|(_, errors)| errors.iter())
        .find_map(|error| error.message.as_ref().map(|msg| msg.to_string()))
        .unwrap_or_else(|| INVALID_INPUT_MESSAGE.to_string())
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::BadRequest(validation_message(&error))
    }
}

/// Any token failure is reported as a generic authentication failure so the
/// client cannot tell a forged token from an expired one.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Encoding(detail) => {
                AppError::InternalServerError(format!("Failed to issue token: {}", detail))
            }
            other => {
                log::debug!("rejected token: {}", other);
                AppError::Unauthorized("Unauthorized".into())
            }
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(error: RepositoryError) -> AppError {
        match error {
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Backend(detail) => AppError::InternalServerError(detail),
        }
    }
}

impl From<HashError> for AppError {
    fn from(error: HashError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let cases = [
            (AppError::BadRequest("Invalid input".into()), 400),
            (AppError::Unauthorized("Unauthorized".into()), 401),
            (AppError::Forbidden("Forbidden".into()), 403),
            (AppError::NotFound("Task not found".into()), 404),
            (AppError::Conflict("User already exists".into()), 409),
            (AppError::InternalServerError("pool timed out".into()), 500),
        ];
        for (error, status) in cases {
            assert_eq!(error.error_response().status(), status, "{}", error);
        }
    }

    #[actix_rt::test]
    async fn test_internal_error_hides_detail() {
        let error = AppError::InternalServerError("connection refused at 10.0.0.5".into());
        let body = actix_web::body::to_bytes(error.error_response().into_body())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], INTERNAL_ERROR_MESSAGE);
        assert!(!String::from_utf8_lossy(&body).contains("10.0.0.5"));
    }

    #[test]
    fn test_token_errors_are_uniform() {
        let expired: AppError = TokenError::Expired.into();
        let forged: AppError = TokenError::InvalidSignature.into();
        assert_eq!(expired, forged);
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: AppError = RepositoryError::Conflict("User already exists".into()).into();
        assert_eq!(err, AppError::Conflict("User already exists".into()));
        let err: AppError = RepositoryError::Backend("disk full".into()).into();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }

    #[test]
    fn test_validation_message_omits_values() {
        let mut errors = ValidationErrors::new();
        let mut secret = validator::ValidationError::new("length");
        secret.add_param("value".into(), &"hunter2-hunter2");
        errors.add("password", secret);
        let err: AppError = errors.into();
        assert_eq!(err, AppError::BadRequest(INVALID_INPUT_MESSAGE.into()));

        let mut errors = ValidationErrors::new();
        let mut title = validator::ValidationError::new("required");
        title.message = Some("Title is required".into());
        errors.add("title", title);
        assert_eq!(validation_message(&errors), "Title is required");
    }
}
