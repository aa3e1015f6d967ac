//! Custom error types for the API service

use auth::error::error_response;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::validation::FieldError;
use thiserror::Error;
use tracing::error;

use crate::booking::AppointmentError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body failed field validation
    #[error("invalid parameters")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Appointment(err) => match err {
                AppointmentError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
                AppointmentError::SlotNotAvailable => StatusCode::CONFLICT,
                AppointmentError::NotFound => StatusCode::NOT_FOUND,
                AppointmentError::Unauthorized(_) => StatusCode::FORBIDDEN,
                AppointmentError::InvalidState(_) => StatusCode::CONFLICT,
                AppointmentError::MaxReschedulesExceeded => StatusCode::UNPROCESSABLE_ENTITY,
                AppointmentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
            return error_response(status, "Internal server error", None);
        }

        match &self {
            ApiError::Validation(errors) => error_response(status, &self.to_string(), Some(errors)),
            _ => error_response(status, &self.to_string(), None),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
