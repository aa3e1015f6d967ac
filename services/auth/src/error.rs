//! Error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{error::DatabaseError, validation::FieldError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Authentication and session errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Request body failed field validation
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// A non-deleted user with the same email exists
    #[error("user with this email already exists")]
    Conflict,

    /// Unknown email or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Deployment precondition not met (e.g. default role missing)
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("token not found")]
    TokenNotFound,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    TokenMismatch,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AuthError {
    /// Status code and client-facing message. Unknown ids and wrong secrets
    /// share one message.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AuthError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AuthError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AuthError::TokenNotFound | AuthError::TokenMismatch => (
                StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::TokenMismatch.to_string(),
            ),
            AuthError::TokenExpired => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AuthError::Configuration(_) | AuthError::Hashing(_) | AuthError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

/// Build the JSON error body used by every service in the workspace
pub fn error_response(status: StatusCode, message: &str, errors: Option<&[FieldError]>) -> Response {
    let body = match errors {
        Some(errors) => json!({ "error": message, "errors": errors }),
        None => json!({ "error": message }),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Authentication request failed: {}", self);
        }
        match &self {
            AuthError::Validation(errors) => error_response(status, &message, Some(errors)),
            _ => error_response(status, &message, None),
        }
    }
}
